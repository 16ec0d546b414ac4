use crate::models::style::{Layer, RenderKind, SourceKind, View};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the single-source demo style and its source.
pub const DEFAULT_STYLE_NAME: &str = "imaginary";

/// Named layer inside the demo vector tiles.
pub const DEFAULT_SOURCE_LAYER: &str = "test";

/// An unresolved tile source: the template is relative to the base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Relative template, e.g. `tiles/{z}/{x}/{y}.pbf`.
    pub template: String,
    #[serde(rename = "minzoom", default)]
    pub min_zoom: u8,
    #[serde(rename = "maxzoom")]
    pub max_zoom: u8,
    #[serde(rename = "tileSize", default, skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<u32>,
}

impl SourceSpec {
    pub fn vector(name: impl Into<String>, template: impl Into<String>, min: u8, max: u8) -> Self {
        SourceSpec {
            name: name.into(),
            kind: SourceKind::Vector,
            template: template.into(),
            min_zoom: min,
            max_zoom: max,
            tile_size: None,
        }
    }

    pub fn raster(name: impl Into<String>, template: impl Into<String>, min: u8, max: u8) -> Self {
        SourceSpec {
            name: name.into(),
            kind: SourceKind::Raster,
            template: template.into(),
            min_zoom: min,
            max_zoom: max,
            tile_size: Some(256),
        }
    }
}

/// Everything needed to compose a style except the base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTemplate {
    pub name: String,
    pub sources: Vec<SourceSpec>,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub view: View,
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read style template: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse style template: {0}")]
    Json(#[from] serde_json::Error),
}

impl StyleTemplate {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the demo style for `count` sources of the given kind.
    ///
    /// A single vector source reproduces the original demo page: one
    /// `imaginary` source under `tiles/` drawn as a fill from its `test`
    /// layer. With several sources each one gets its own tile set directory
    /// (`tiles/imaginary-<i>/`) and a sub-layer of the same name.
    pub fn preset(kind: SourceKind, count: usize) -> Self {
        let count = count.max(1);
        let extension = match kind {
            SourceKind::Vector => "pbf",
            SourceKind::Raster => "png",
        };

        let mut sources = Vec::with_capacity(count);
        let mut layers = vec![
            Layer::new("background", RenderKind::Background)
                .with_paint("background-color", "#505050"),
        ];

        for i in 0..count {
            let (name, template) = if count == 1 {
                (
                    DEFAULT_STYLE_NAME.to_string(),
                    format!("tiles/{{z}}/{{x}}/{{y}}.{extension}"),
                )
            } else {
                let name = format!("{DEFAULT_STYLE_NAME}-{i}");
                let template = format!("tiles/{name}/{{z}}/{{x}}/{{y}}.{extension}");
                (name, template)
            };

            let layer = match kind {
                SourceKind::Vector => {
                    let source_layer = if count == 1 {
                        DEFAULT_SOURCE_LAYER.to_string()
                    } else {
                        name.clone()
                    };
                    sources.push(SourceSpec::vector(&name, template, 0, 1));
                    Layer::new(&name, RenderKind::Fill)
                        .with_source(&name)
                        .with_source_layer(source_layer)
                        .with_paint("fill-color", "#AFDB1C")
                        .with_paint("fill-outline-color", "#181E04")
                }
                SourceKind::Raster => {
                    sources.push(SourceSpec::raster(&name, template, 0, 1));
                    Layer::new(&name, RenderKind::Raster).with_source(&name)
                }
            };
            layers.push(layer);
        }

        StyleTemplate {
            name: DEFAULT_STYLE_NAME.to_string(),
            sources,
            layers,
            view: View::default(),
        }
    }
}

impl Default for StyleTemplate {
    fn default() -> Self {
        Self::preset(SourceKind::Vector, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_preset_matches_demo_page() {
        let template = StyleTemplate::default();
        assert_eq!(template.name, "imaginary");
        assert_eq!(template.sources.len(), 1);

        let source = &template.sources[0];
        assert_eq!(source.name, "imaginary");
        assert_eq!(source.kind, SourceKind::Vector);
        assert_eq!(source.template, "tiles/{z}/{x}/{y}.pbf");
        assert_eq!((source.min_zoom, source.max_zoom), (0, 1));

        let ids: Vec<_> = template.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["background", "imaginary"]);
        assert_eq!(template.layers[1].source_layer.as_deref(), Some("test"));
        assert_eq!(template.view.center, (-74.5, 40.0));
    }

    #[test]
    fn test_multi_source_preset_separates_tile_sets() {
        let template = StyleTemplate::preset(SourceKind::Vector, 3);
        let templates: Vec<_> = template.sources.iter().map(|s| s.template.as_str()).collect();
        assert_eq!(
            templates,
            vec![
                "tiles/imaginary-0/{z}/{x}/{y}.pbf",
                "tiles/imaginary-1/{z}/{x}/{y}.pbf",
                "tiles/imaginary-2/{z}/{x}/{y}.pbf",
            ]
        );
        assert_eq!(template.layers.len(), 4);
        assert_eq!(
            template.layers[2].source_layer.as_deref(),
            Some("imaginary-1")
        );
    }

    #[test]
    fn test_raster_preset_has_no_source_layers() {
        let template = StyleTemplate::preset(SourceKind::Raster, 1);
        assert_eq!(template.sources[0].template, "tiles/{z}/{x}/{y}.png");
        assert_eq!(template.sources[0].tile_size, Some(256));
        assert!(template.layers.iter().all(|l| l.source_layer.is_none()));
        assert_eq!(template.layers[1].kind, RenderKind::Raster);
    }

    #[test]
    fn test_zero_sources_is_clamped_to_one() {
        assert_eq!(StyleTemplate::preset(SourceKind::Vector, 0).sources.len(), 1);
    }

    #[test]
    fn test_loads_template_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                "name": "papers",
                "sources": [
                    {{ "name": "papers", "type": "vector", "template": "tiles/papers/{{z}}/{{x}}/{{y}}.pbf", "maxzoom": 4 }}
                ],
                "layers": [
                    {{ "id": "papers", "type": "circle", "source": "papers", "source-layer": "papers",
                       "paint": {{ "circle-color": "#ff0000" }} }}
                ]
            }}"##
        )
        .unwrap();

        let template = StyleTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.name, "papers");
        assert_eq!(template.sources[0].min_zoom, 0);
        assert_eq!(template.sources[0].max_zoom, 4);
        assert_eq!(template.layers[0].kind, RenderKind::Circle);
        assert_eq!(template.view, View::default());
    }

    #[test]
    fn test_invalid_template_reports_parse_error() {
        let err = StyleTemplate::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TemplateError::Json(_)));
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Style format version understood by Mapbox GL / MapLibre renderers.
pub const STYLE_VERSION: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Vector,
    Raster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderKind {
    Background,
    Fill,
    Line,
    Circle,
    Symbol,
    Raster,
    FillExtrusion,
    Heatmap,
    Hillshade,
}

/// A resolved tile source. The name lives in the `sources` map key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Absolute template with unresolved `{z}`, `{x}` and `{y}` placeholders.
    #[serde(
        rename = "tiles",
        serialize_with = "template_as_list",
        deserialize_with = "template_from_list"
    )]
    pub url_template: String,
    #[serde(rename = "minzoom")]
    pub min_zoom: u8,
    #[serde(rename = "maxzoom")]
    pub max_zoom: u8,
    #[serde(rename = "tileSize", default, skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<u32>,
}

fn template_as_list<S: Serializer>(template: &str, serializer: S) -> Result<S::Ok, S::Error> {
    [template].serialize(serializer)
}

fn template_from_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let tiles = Vec::<String>::deserialize(deserializer)?;
    tiles
        .into_iter()
        .next()
        .ok_or_else(|| serde::de::Error::custom("source declares no tile templates"))
}

/// A rendering instruction, identical in templates and resolved styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RenderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        rename = "source-layer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_layer: Option<String>,
    /// Opaque paint properties, handed through to the renderer untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
}

impl Layer {
    pub fn new(id: impl Into<String>, kind: RenderKind) -> Self {
        Layer {
            id: id.into(),
            kind,
            source: None,
            source_layer: None,
            paint: Map::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn with_paint(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.paint.insert(property.to_string(), value.into());
        self
    }
}

/// Initial camera. Serialized as the root `center`/`zoom` style properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// (longitude, latitude)
    pub center: (f64, f64),
    pub zoom: f64,
}

impl Default for View {
    fn default() -> Self {
        View {
            center: (-74.5, 40.0),
            zoom: 9.0,
        }
    }
}

/// Fully resolved style handed to the renderer.
///
/// Built by [`crate::resolver::compose_style_document`], which guarantees
/// that every layer's source exists and that vector consumers name their
/// source layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    pub version: u8,
    pub name: String,
    pub sources: BTreeMap<String, TileSource>,
    pub layers: Vec<Layer>,
    #[serde(flatten)]
    pub view: View,
}

impl StyleDocument {
    pub fn source(&self, name: &str) -> Option<&TileSource> {
        self.sources.get(name)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layers drawing from the given source, in render order.
    pub fn layers_for_source(&self, source: &str) -> Vec<&Layer> {
        self.layers
            .iter()
            .filter(|l| l.source.as_deref() == Some(source))
            .collect()
    }
}

use super::error::ConfigurationError;
use super::location::build_tile_url_template;
use crate::models::{
    Layer, STYLE_VERSION, SourceKind, SourceSpec, StyleDocument, TileSource, View,
};
use std::collections::{BTreeMap, HashSet};

const PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// Resolves source templates against `base_url` and validates the layers.
///
/// Layer order is preserved. Fails on the first layer or source that would
/// leave the renderer with a dangling reference.
pub fn compose_style_document(
    base_url: &str,
    name: &str,
    source_specs: &[SourceSpec],
    layer_specs: &[Layer],
    view: View,
) -> Result<StyleDocument, ConfigurationError> {
    check_base_url(base_url)?;

    let mut sources = BTreeMap::new();
    for spec in source_specs {
        if sources.contains_key(&spec.name) {
            return Err(ConfigurationError::DuplicateSource(spec.name.clone()));
        }
        sources.insert(spec.name.clone(), resolve_source(base_url, spec)?);
    }

    validate_layers(&sources, layer_specs)?;

    Ok(StyleDocument {
        version: STYLE_VERSION,
        name: name.to_string(),
        sources,
        layers: layer_specs.to_vec(),
        view,
    })
}

pub(crate) fn check_base_url(base_url: &str) -> Result<(), ConfigurationError> {
    if base_url.is_empty() || !base_url.ends_with('/') {
        return Err(ConfigurationError::InvalidBaseUrl(base_url.to_string()));
    }
    Ok(())
}

/// Turns a [`SourceSpec`] into a [`TileSource`] with an absolute template.
pub(crate) fn resolve_source(
    base_url: &str,
    spec: &SourceSpec,
) -> Result<TileSource, ConfigurationError> {
    if spec.max_zoom < spec.min_zoom {
        return Err(ConfigurationError::InvalidZoomRange {
            source_name: spec.name.clone(),
            min: spec.min_zoom,
            max: spec.max_zoom,
        });
    }
    if let Some(&placeholder) = PLACEHOLDERS.iter().find(|p| !spec.template.contains(**p)) {
        return Err(ConfigurationError::MissingPlaceholder {
            source_name: spec.name.clone(),
            template: spec.template.clone(),
            placeholder,
        });
    }

    Ok(TileSource {
        kind: spec.kind,
        url_template: build_tile_url_template(base_url, &spec.template),
        min_zoom: spec.min_zoom,
        max_zoom: spec.max_zoom,
        tile_size: spec.tile_size,
    })
}

/// Layer invariants shared by initial composition and incremental updates.
pub(crate) fn validate_layers(
    sources: &BTreeMap<String, TileSource>,
    layers: &[Layer],
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for layer in layers {
        if !seen.insert(layer.id.as_str()) {
            return Err(ConfigurationError::DuplicateLayer(layer.id.clone()));
        }

        let Some(source_name) = layer.source.as_deref() else {
            continue;
        };
        let source = sources
            .get(source_name)
            .ok_or_else(|| ConfigurationError::UnknownSource {
                layer: layer.id.clone(),
                source_name: source_name.to_string(),
            })?;

        if source.kind == SourceKind::Vector && layer.source_layer.is_none() {
            return Err(ConfigurationError::MissingSourceLayer {
                layer: layer.id.clone(),
                source_name: source_name.to_string(),
            });
        }
    }
    Ok(())
}

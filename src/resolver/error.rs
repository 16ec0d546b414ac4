/// A style that cannot be handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("layer '{layer}' references unknown source '{source_name}'")]
    UnknownSource { layer: String, source_name: String },
    #[error("layer '{layer}' draws vector source '{source_name}' without a source-layer")]
    MissingSourceLayer { layer: String, source_name: String },
    #[error("source '{0}' is declared more than once")]
    DuplicateSource(String),
    #[error("layer id '{0}' is used more than once")]
    DuplicateLayer(String),
    #[error("source '{source_name}' has maxzoom {max} below minzoom {min}")]
    InvalidZoomRange { source_name: String, min: u8, max: u8 },
    #[error("source '{source_name}' template '{template}' lacks the {placeholder} placeholder")]
    MissingPlaceholder {
        source_name: String,
        template: String,
        placeholder: &'static str,
    },
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl ConfigurationError {
    /// Id of the offending layer, when the failure is tied to one.
    pub fn layer_id(&self) -> Option<&str> {
        match self {
            ConfigurationError::UnknownSource { layer, .. }
            | ConfigurationError::MissingSourceLayer { layer, .. } => Some(layer),
            ConfigurationError::DuplicateLayer(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("unparseable page location '{url}': {source}")]
    Unparseable {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("page location '{0}' has no origin")]
    NoOrigin(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("renderer is not ready; style changes must wait for the ready notification")]
    NotReady,
    #[error("renderer went away before signalling readiness")]
    ReadyDropped,
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

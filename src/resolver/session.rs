use super::compose::{check_base_url, resolve_source, validate_layers};
use super::error::{ConfigurationError, SessionError};
use crate::models::{Layer, SourceSpec, StyleDocument};
use tokio::sync::watch;
use tracing::debug;

/// Creates the one-shot "renderer ready" notification pair.
pub fn ready_channel() -> (ReadyNotifier, ReadyListener) {
    let (tx, rx) = watch::channel(false);
    (ReadyNotifier { tx }, ReadyListener { rx })
}

/// Held by the renderer. Firing consumes it.
pub struct ReadyNotifier {
    tx: watch::Sender<bool>,
}

impl ReadyNotifier {
    pub fn notify(self) {
        self.tx.send_replace(true);
    }
}

#[derive(Clone)]
pub struct ReadyListener {
    rx: watch::Receiver<bool>,
}

impl ReadyListener {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn wait(&mut self) -> Result<(), SessionError> {
        self.rx
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| SessionError::ReadyDropped)
    }
}

/// Sources and layers added to a live style in one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleIncrement {
    pub sources: Vec<SourceSpec>,
    pub layers: Vec<Layer>,
}

impl StyleIncrement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: SourceSpec) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }
}

/// A style owned by one page session, mutated only after the renderer is
/// ready.
pub struct StyleSession {
    base_url: String,
    document: StyleDocument,
    ready: ReadyListener,
}

impl StyleSession {
    pub fn new(base_url: impl Into<String>, document: StyleDocument, ready: ReadyListener) -> Self {
        StyleSession {
            base_url: base_url.into(),
            document,
            ready,
        }
    }

    pub fn document(&self) -> &StyleDocument {
        &self.document
    }

    pub fn into_document(self) -> StyleDocument {
        self.document
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    pub async fn wait_ready(&mut self) -> Result<(), SessionError> {
        self.ready.wait().await
    }

    /// Adds the increment's sources and layers.
    ///
    /// Returns `Ok(false)` when everything in the increment was already
    /// present with an identical definition. On error the document is left
    /// untouched.
    pub fn apply(&mut self, increment: &StyleIncrement) -> Result<bool, SessionError> {
        if !self.ready.is_ready() {
            return Err(SessionError::NotReady);
        }
        check_base_url(&self.base_url)?;

        let mut sources = self.document.sources.clone();
        for spec in &increment.sources {
            let resolved = resolve_source(&self.base_url, spec)?;
            match sources.get(&spec.name) {
                Some(existing) if *existing == resolved => {}
                Some(_) => return Err(ConfigurationError::DuplicateSource(spec.name.clone()).into()),
                None => {
                    sources.insert(spec.name.clone(), resolved);
                }
            }
        }

        let mut layers = self.document.layers.clone();
        for layer in &increment.layers {
            match layers.iter().find(|l| l.id == layer.id) {
                Some(existing) if existing == layer => {}
                Some(_) => return Err(ConfigurationError::DuplicateLayer(layer.id.clone()).into()),
                None => layers.push(layer.clone()),
            }
        }

        validate_layers(&sources, &layers)?;

        let changed = sources.len() != self.document.sources.len()
            || layers.len() != self.document.layers.len();
        if changed {
            debug!(
                sources = sources.len(),
                layers = layers.len(),
                "applied style increment"
            );
        }
        self.document.sources = sources;
        self.document.layers = layers;
        Ok(changed)
    }
}

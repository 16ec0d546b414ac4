pub mod style;
pub mod template;

pub use style::{Layer, RenderKind, STYLE_VERSION, SourceKind, StyleDocument, TileSource, View};
pub use template::{SourceSpec, StyleTemplate, TemplateError};

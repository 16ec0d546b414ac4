//! Resolution of page location and query parameters into a style document.

use crate::models::{SourceKind, StyleDocument, StyleTemplate};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

pub mod compose;
pub mod error;
pub mod location;
pub mod session;

pub use compose::compose_style_document;
pub use error::{ConfigurationError, LocationError, SessionError};
pub use location::{
    BaseLocation, PageLocation, build_tile_url_template, derive_base_url, dirname,
};
pub use session::{ReadyListener, ReadyNotifier, StyleIncrement, StyleSession, ready_channel};

/// Query parameter carrying the renderer credential.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Query parameter overriding the base URL of every tile template.
pub const TILE_API_PARAM: &str = "tile-api";

pub type QueryParams = HashMap<String, String>;

/// Decodes an `application/x-www-form-urlencoded` query string. The last
/// occurrence of a repeated key wins.
pub fn parse_query(query: &str) -> QueryParams {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// The access credential, if the page was given a non-empty one.
pub fn resolve_access_credential(params: &QueryParams) -> Option<String> {
    params
        .get(ACCESS_TOKEN_PARAM)
        .filter(|token| !token.is_empty())
        .cloned()
}

/// How tile templates are anchored. One strategy applies to a whole
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BaseUrlStrategy {
    /// Directory containing the page; survives being served from a sub-path.
    #[default]
    Relative,
    /// Root of the page's origin.
    OriginRoot,
    /// A fixed, externally hosted tile API.
    ExternalApi(String),
}

impl BaseUrlStrategy {
    pub fn base_url(&self, location: &PageLocation) -> Result<String, ConfigurationError> {
        match self {
            BaseUrlStrategy::Relative => Ok(derive_base_url(location)),
            BaseUrlStrategy::OriginRoot => Ok(location::origin_root_url(location)),
            BaseUrlStrategy::ExternalApi(api) => external_api_base(api),
        }
    }

    pub fn serves_local_tiles(&self) -> bool {
        !matches!(self, BaseUrlStrategy::ExternalApi(_))
    }
}

/// An absolute tile API base with a trailing `/`.
fn external_api_base(api: &str) -> Result<String, ConfigurationError> {
    let url = Url::parse(api).map_err(|_| ConfigurationError::InvalidBaseUrl(api.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigurationError::InvalidBaseUrl(api.to_string()));
    }
    Ok(location::ensure_trailing_separator(api))
}

/// Knobs that used to be spread over hand-copied demo scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub tile_kind: SourceKind,
    pub source_count: usize,
    pub credential_required: bool,
    pub base_url_strategy: BaseUrlStrategy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            tile_kind: SourceKind::Vector,
            source_count: 1,
            credential_required: false,
            base_url_strategy: BaseUrlStrategy::Relative,
        }
    }
}

/// Output of one resolution: the document plus the values the page needs
/// to hand to the renderer alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub base_url: String,
    pub access_token: Option<String>,
    pub document: StyleDocument,
}

#[derive(Debug, Clone)]
pub struct StyleResolver {
    template: StyleTemplate,
    strategy: BaseUrlStrategy,
    credential_required: bool,
}

impl StyleResolver {
    pub fn new(template: StyleTemplate, strategy: BaseUrlStrategy, credential_required: bool) -> Self {
        StyleResolver {
            template,
            strategy,
            credential_required,
        }
    }

    pub fn from_options(options: &ResolverOptions) -> Self {
        Self::new(
            StyleTemplate::preset(options.tile_kind, options.source_count),
            options.base_url_strategy.clone(),
            options.credential_required,
        )
    }

    pub fn template(&self) -> &StyleTemplate {
        &self.template
    }

    pub fn strategy(&self) -> &BaseUrlStrategy {
        &self.strategy
    }

    pub fn credential_required(&self) -> bool {
        self.credential_required
    }

    /// Base URL for every template of the document. A `tile-api` parameter
    /// overrides the configured strategy.
    pub fn base_url(
        &self,
        location: &PageLocation,
        params: &QueryParams,
    ) -> Result<String, ConfigurationError> {
        match params.get(TILE_API_PARAM).filter(|api| !api.is_empty()) {
            Some(api) => external_api_base(api),
            None => self.strategy.base_url(location),
        }
    }

    pub fn resolve(
        &self,
        location: &PageLocation,
        params: &QueryParams,
    ) -> Result<Resolution, ConfigurationError> {
        let base_url = self.base_url(location, params)?;
        debug!(%base_url, "resolved base url");

        let document = compose_style_document(
            &base_url,
            &self.template.name,
            &self.template.sources,
            &self.template.layers,
            self.template.view,
        )?;

        Ok(Resolution {
            base_url,
            access_token: resolve_access_credential(params),
            document,
        })
    }

    /// Resolves the initial style and wraps it in a session that accepts
    /// increments once `ready` fires.
    pub fn open_session(
        &self,
        location: &PageLocation,
        params: &QueryParams,
        ready: ReadyListener,
    ) -> Result<StyleSession, ConfigurationError> {
        let resolution = self.resolve(location, params)?;
        Ok(StyleSession::new(
            resolution.base_url,
            resolution.document,
            ready,
        ))
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::from_options(&ResolverOptions::default())
    }
}

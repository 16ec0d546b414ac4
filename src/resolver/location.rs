use super::error::LocationError;
use std::fmt;
use url::Url;

/// Where the hosting page was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Scheme, host and (non-default) port, e.g. `http://localhost:3000`.
    pub origin: String,
    pub pathname: String,
}

impl PageLocation {
    pub fn new(origin: impl Into<String>, pathname: impl Into<String>) -> Self {
        PageLocation {
            origin: origin.into(),
            pathname: pathname.into(),
        }
    }

    /// Splits an absolute page URL into origin and pathname. Query and
    /// fragment are dropped.
    pub fn parse(page_url: &str) -> Result<Self, LocationError> {
        let url = Url::parse(page_url).map_err(|source| LocationError::Unparseable {
            url: page_url.to_string(),
            source,
        })?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(LocationError::NoOrigin(page_url.to_string()));
        }
        Ok(PageLocation {
            origin: origin.ascii_serialization(),
            pathname: url.path().to_string(),
        })
    }
}

/// Origin plus the directory containing the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLocation {
    pub origin: String,
    pub path: String,
}

impl From<&PageLocation> for BaseLocation {
    fn from(location: &PageLocation) -> Self {
        BaseLocation {
            origin: location.origin.clone(),
            path: dirname(&location.pathname).to_string(),
        }
    }
}

impl fmt::Display for BaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.path)
    }
}

/// Directory part of `path`, keeping the trailing `/`.
///
/// A path with no `/` at all is returned unchanged.
pub fn dirname(path: &str) -> &str {
    if path.ends_with('/') {
        return path;
    }
    match path.rfind('/') {
        Some(i) => &path[..=i],
        None => path,
    }
}

/// `origin` + containing directory of the page, with a trailing `/`.
pub fn derive_base_url(location: &PageLocation) -> String {
    BaseLocation::from(location).to_string()
}

/// Base URL at the root of the page's origin.
pub fn origin_root_url(location: &PageLocation) -> String {
    format!("{}/", location.origin)
}

/// Appends a trailing `/` when missing.
pub fn ensure_trailing_separator(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

/// Joins a base URL and a relative tile template. Placeholders are left for
/// the renderer to fill in at fetch time.
pub fn build_tile_url_template(base_url: &str, relative_template: &str) -> String {
    format!("{base_url}{relative_template}")
}

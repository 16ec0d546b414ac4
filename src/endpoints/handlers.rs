use crate::endpoints::map::INDEX_HTML;
use crate::endpoints::server::AppState;
use crate::resolver::{
    ACCESS_TOKEN_PARAM, ConfigurationError, LocationError, PageLocation, parse_query,
    resolve_access_credential,
};
use crate::tiles::TileCoord;
use axum::{
    Json,
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};
use url::Url;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// File name the style document is served under, in any directory.
pub const STYLE_FILE: &str = "style.json";

/// URL prefix the tile tree is mounted under.
pub const TILES_MOUNT: &str = "/tiles";

pub async fn webmap_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// Everything below `/tiles/`. Paths ending in `{z}/{x}/{y}.{ext}` are
/// checked against the tile grid first; any other file in the tile tree is
/// served as is.
pub async fn tile_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    req: Request,
) -> Response {
    let coord = match TileCoord::from_tile_path(&path) {
        Ok(coord) => coord.map(|(coord, _)| coord),
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let extension = path
        .rsplit('/')
        .next()
        .and_then(|file| file.split_once('.'))
        .map_or("", |(_, ext)| ext);

    // Keep the still-encoded path, relative to the tile root
    let relative = req
        .uri()
        .path()
        .strip_prefix(TILES_MOUNT)
        .unwrap_or_default()
        .to_string();
    let (mut parts, body) = req.into_parts();
    parts.uri = match format!("/{}", relative.trim_start_matches('/')).parse::<Uri>() {
        Ok(uri) => uri,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid tile path").into_response(),
    };

    // ServeDir picks `<file>.gz` when the client accepts gzip
    let mut tiles = state.tiles.clone();
    match tiles.try_call(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let mut response = response.into_response();
            if response.status().is_success() {
                if let Some(content_type) = tile_content_type(extension) {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                }
            } else {
                debug!(path = %path, ?coord, status = %response.status(), "tile not served");
            }
            response
        }
        Err(err) => {
            error!(path = %path, "tile read failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "tile read failed").into_response()
        }
    }
}

fn tile_content_type(extension: &str) -> Option<&'static str> {
    match extension {
        "pbf" | "mvt" => Some("application/x-protobuf"),
        _ => None,
    }
}

pub async fn style_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    style_response(&state, &headers, &uri)
}

/// Serves `style.json` from nested directories, everything else from the
/// document root.
pub async fn fallback_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let is_style = req.method() == Method::GET
        && req
            .uri()
            .path()
            .rsplit('/')
            .next()
            .is_some_and(|name| name == STYLE_FILE);
    if is_style {
        return style_response(&state, req.headers(), req.uri());
    }

    let mut docs = state.docs.clone();
    match docs.try_call(req).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            error!("document read failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "document read failed").into_response()
        }
    }
}

fn style_response(state: &AppState, headers: &HeaderMap, uri: &Uri) -> Response {
    let location = match page_location(headers, uri) {
        Ok(location) => location,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let params = parse_query(uri.query().unwrap_or_default());

    if state.resolver.credential_required() && resolve_access_credential(&params).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            format!("{ACCESS_TOKEN_PARAM} is required"),
        )
            .into_response();
    }

    match state.resolver.resolve(&location, &params) {
        Ok(resolution) => (StatusCode::OK, Json(resolution.document)).into_response(),
        Err(e @ ConfigurationError::InvalidBaseUrl(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            error!("style resolution failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// The requesting page's location.
///
/// A same-host `Referer` is the page itself. Without one, the style is
/// taken to sit next to the page, so the request path shares the page's
/// directory. The scheme follows `X-Forwarded-Proto` behind a TLS proxy.
fn page_location(headers: &HeaderMap, uri: &Uri) -> Result<PageLocation, LocationError> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .ok_or_else(|| LocationError::NoOrigin(uri.path().to_string()))?;

    if let Some(referer) = same_host_referer(headers, host) {
        return Ok(referer);
    }

    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|h| h.to_str().ok())
        .and_then(|protos| protos.split(',').next())
        .map(str::trim)
        .filter(|proto| !proto.is_empty())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    PageLocation::parse(&format!("{}://{}{}", scheme, host, uri.path()))
}

fn same_host_referer(headers: &HeaderMap, host: &str) -> Option<PageLocation> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let url = Url::parse(referer).ok()?;
    let authority = match (url.host_str(), url.port()) {
        (Some(name), Some(port)) => format!("{name}:{port}"),
        (Some(name), None) => name.to_string(),
        (None, _) => return None,
    };
    if !authority.eq_ignore_ascii_case(host) {
        debug!(referer, host, "ignoring cross-host referer");
        return None;
    }
    PageLocation::parse(referer).ok()
}

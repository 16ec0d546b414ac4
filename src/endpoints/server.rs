use crate::config::Config;
use crate::endpoints::handlers::{
    fallback_handler, style_handler, tile_handler, webmap_handler,
};
use crate::models::StyleTemplate;
use crate::resolver::{PageLocation, QueryParams, StyleResolver};
use crate::utils::status::{SourceReport, build_source_reports, print_style_summary};
use anyhow::Context;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct AppState {
    pub resolver: StyleResolver,
    /// Tile tree with gzip negotiation.
    pub tiles: ServeDir,
    pub docs: ServeDir,
}

impl AppState {
    pub fn new(resolver: StyleResolver, tiles_root: &Path, docs_root: &Path) -> Self {
        AppState {
            resolver,
            tiles: ServeDir::new(tiles_root).precompressed_gzip(),
            docs: ServeDir::new(docs_root),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tiles/{*path}", get(tile_handler))
        .route("/style.json", get(style_handler))
        .route("/map", get(webmap_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct TileServer {
    config: Config,
    state: AppState,
    reports: Vec<SourceReport>,
}

impl TileServer {
    /// Loads the style template and refuses to start if it cannot be
    /// resolved into a valid style.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let template = match &config.style_template {
            Some(path) => StyleTemplate::from_file(path)
                .with_context(|| format!("loading style template {}", path.display()))?,
            None => StyleTemplate::preset(config.resolver.tile_kind, config.resolver.source_count),
        };
        let resolver = StyleResolver::new(
            template,
            config.resolver.base_url_strategy.clone(),
            config.resolver.credential_required,
        );

        let startup_location = PageLocation::new(format!("http://localhost:{}", config.port), "/");
        resolver
            .resolve(&startup_location, &QueryParams::new())
            .context("style template does not resolve to a valid style")?;

        let reports = build_source_reports(
            resolver.template(),
            &config.tiles_root,
            resolver.strategy().serves_local_tiles(),
        );
        let state = AppState::new(resolver, &config.tiles_root, &config.docs_root);

        Ok(Self {
            config,
            state,
            reports,
        })
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let template = self.state.resolver.template();
        print_style_summary(&template.name, &self.reports, template.layers.len());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {}", addr))?;

        let port = self.config.port;
        let tile_count: usize = self.reports.iter().map(|r| r.tiles).sum();
        let example_tiles = template
            .sources
            .first()
            .map(|s| s.template.as_str())
            .unwrap_or("tiles/{z}/{x}/{y}.pbf");
        println!(
            r#"
    🚀 Imaginary Map serving on {}

    🗺️ Style document (pass ?access_token=… or ?tile-api=… as needed)
       → http://localhost:{}/style.json

    🌍 Demo map
       → http://localhost:{}/map

    🧱 Tiles ({} on disk, gzip-negotiated)
       → http://localhost:{}/{}

    📂 Documents
       → {}
            "#,
            addr,
            port,
            port,
            tile_count,
            port,
            example_tiles,
            self.config.docs_root.display()
        );
        info!(%addr, environment = ?self.config.environment, "listening");

        let app = router(Arc::new(self.state));
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Layer, RenderKind};
    use crate::resolver::{BaseUrlStrategy, ResolverOptions};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const RAW_TILE: &[u8] = b"raw-tile-bytes";
    const GZ_TILE: &[u8] = b"\x1f\x8bgzipped-tile-bytes";

    struct Fixture {
        _dir: TempDir,
        app: Router,
    }

    fn fixture(resolver: StyleResolver) -> Fixture {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        let tiles = docs.join("tiles");
        fs::create_dir_all(tiles.join("0/0")).unwrap();
        fs::create_dir_all(tiles.join("islands/1/1")).unwrap();
        fs::write(tiles.join("0/0/0.pbf"), RAW_TILE).unwrap();
        fs::write(tiles.join("0/0/0.pbf.gz"), GZ_TILE).unwrap();
        fs::write(tiles.join("islands/1/1/0.pbf"), RAW_TILE).unwrap();
        fs::create_dir_all(tiles.join("v1/islands/0/0")).unwrap();
        fs::write(tiles.join("v1/islands/0/0/0.pbf.gz"), GZ_TILE).unwrap();
        fs::write(tiles.join("v1/tiles.json"), "{}").unwrap();
        fs::write(docs.join("index.html"), "<html></html>").unwrap();

        let state = AppState::new(resolver, &tiles, &docs);
        Fixture {
            _dir: dir,
            app: router(Arc::new(state)),
        }
    }

    fn get(uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "localhost:3000")
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn style_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = body_bytes(response).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_gzip_variant_served_when_accepted() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(
                get("/tiles/0/0/0.pbf")
                    .header(header::ACCEPT_ENCODING, "gzip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-protobuf"
        );
        assert_eq!(body_bytes(response).await, GZ_TILE);
    }

    #[tokio::test]
    async fn test_plain_tile_served_without_accept_encoding() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(get("/tiles/0/0/0.pbf").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(body_bytes(response).await, RAW_TILE);
    }

    #[tokio::test]
    async fn test_tile_set_and_missing_tile() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .clone()
            .oneshot(get("/tiles/islands/1/1/0.pbf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = f
            .app
            .oneshot(get("/tiles/1/0/0.pbf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_tile_set_is_gzip_negotiated() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(
                get("/tiles/v1/islands/0/0/0.pbf")
                    .header(header::ACCEPT_ENCODING, "gzip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-protobuf"
        );
        assert_eq!(body_bytes(response).await, GZ_TILE);
    }

    #[tokio::test]
    async fn test_non_tile_files_come_from_the_tile_tree() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .clone()
            .oneshot(get("/tiles/v1/tiles.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"{}");

        let response = f
            .app
            .clone()
            .oneshot(get("/tiles/a/b/c.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // no style document below the tile root
        let response = f
            .app
            .oneshot(get("/tiles/style.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_tile_coordinates_are_bad_requests() {
        let f = fixture(StyleResolver::default());
        for uri in ["/tiles/0/-1/0.pbf", "/tiles/1/2/0.pbf", "/tiles/a/0/0.pbf"] {
            let response = f
                .app
                .clone()
                .oneshot(get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_documents_served_from_docs_root() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(get("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<html></html>");
    }

    #[tokio::test]
    async fn test_style_resolves_against_request_directory() {
        let f = fixture(StyleResolver::default());

        let (status, style) = style_json(f.app.clone(), "/style.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(style["version"], 8);
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "http://localhost:3000/tiles/{z}/{x}/{y}.pbf"
        );
        assert_eq!(style["layers"][1]["source-layer"], "test");

        let (status, style) = style_json(f.app, "/app/style.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "http://localhost:3000/app/tiles/{z}/{x}/{y}.pbf"
        );
    }

    #[tokio::test]
    async fn test_style_follows_same_host_referer() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .clone()
            .oneshot(
                get("/style.json")
                    .header(header::REFERER, "https://localhost:3000/demo/index.html?x=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let style: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "https://localhost:3000/demo/tiles/{z}/{x}/{y}.pbf"
        );

        let response = f
            .app
            .oneshot(
                get("/app/style.json")
                    .header(header::REFERER, "https://elsewhere.example/page.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let style: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "http://localhost:3000/app/tiles/{z}/{x}/{y}.pbf"
        );
    }

    #[tokio::test]
    async fn test_forwarded_proto_sets_the_scheme() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(
                get("/app/style.json")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let style: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "https://localhost:3000/app/tiles/{z}/{x}/{y}.pbf"
        );
    }

    #[tokio::test]
    async fn test_tile_api_parameter_overrides_base() {
        let f = fixture(StyleResolver::default());
        let (status, style) = style_json(
            f.app,
            "/style.json?tile-api=https%3A%2F%2Ftiles.example.com%2Fv1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "https://tiles.example.com/v1/tiles/{z}/{x}/{y}.pbf"
        );
    }

    #[tokio::test]
    async fn test_required_credential_is_enforced() {
        let resolver = StyleResolver::from_options(&ResolverOptions {
            credential_required: true,
            base_url_strategy: BaseUrlStrategy::OriginRoot,
            ..ResolverOptions::default()
        });
        let f = fixture(resolver);

        let (status, _) = style_json(f.app.clone(), "/style.json").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, style) = style_json(f.app, "/app/style.json?access_token=pk.1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            style["sources"]["imaginary"]["tiles"][0],
            "http://localhost:3000/tiles/{z}/{x}/{y}.pbf"
        );
    }

    #[tokio::test]
    async fn test_missing_host_is_a_bad_request() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(
                Request::builder()
                    .uri("/style.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_map_page_is_served() {
        let f = fixture(StyleResolver::default());
        let response = f
            .app
            .oneshot(get("/map").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("style.json"));
    }

    #[test]
    fn test_server_refuses_invalid_template() {
        let dir = TempDir::new().unwrap();
        let mut template = StyleTemplate::default();
        template
            .layers
            .push(Layer::new("papers", RenderKind::Circle).with_source("papers"));
        let path = dir.path().join("style.json");
        fs::write(&path, serde_json::to_string(&template).unwrap()).unwrap();

        let config = Config {
            style_template: Some(path),
            tiles_root: dir.path().join("tiles"),
            docs_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        let err = TileServer::new(config).err().unwrap();
        assert!(format!("{err:#}").contains("papers"));
    }

    #[test]
    fn test_server_refuses_malformed_external_api() {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            tiles_root: dir.path().join("tiles"),
            docs_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        config.resolver.base_url_strategy = BaseUrlStrategy::ExternalApi("not a url".to_string());

        let err = TileServer::new(config).err().unwrap();
        assert!(format!("{err:#}").contains("not a url"));
    }

    #[test]
    fn test_server_builds_from_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            tiles_root: dir.path().join("tiles"),
            docs_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert!(TileServer::new(config).is_ok());
    }
}

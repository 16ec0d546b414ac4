use clap::{Parser, ValueEnum};
use imaginary_map::models::SourceKind;
use imaginary_map::resolver::{BaseUrlStrategy, ResolverOptions};
use imaginary_map::{Config, Environment, TileServer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TileKind {
    Vector,
    Raster,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    Relative,
    OriginRoot,
    ExternalApi,
}

/// Serves pre-generated map tiles and the style document that points at them.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Document root served at `/`
    #[arg(long, default_value = "docs")]
    docs_root: PathBuf,

    /// Tile tree served at `/tiles/` [default: <docs-root>/tiles]
    #[arg(long)]
    tiles_root: Option<PathBuf>,

    /// JSON style template replacing the built-in preset
    #[arg(long)]
    style: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TileKind::Vector)]
    tile_kind: TileKind,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    source_count: u16,

    /// How tile templates are anchored
    #[arg(long, value_enum, default_value_t = Strategy::Relative)]
    strategy: Strategy,

    /// Tile API base, required by `--strategy external-api`
    #[arg(long, required_if_eq("strategy", "external-api"))]
    tile_api: Option<String>,

    /// Answer 401 to style requests without `access_token`
    #[arg(long)]
    require_token: bool,

    #[arg(long = "env", env = "MAP_ENV", value_enum, default_value_t = Environment::Development)]
    environment: Environment,
}

impl Cli {
    fn into_config(self) -> Config {
        let base_url_strategy = match (self.strategy, self.tile_api) {
            (Strategy::Relative, _) => BaseUrlStrategy::Relative,
            (Strategy::OriginRoot, _) => BaseUrlStrategy::OriginRoot,
            (Strategy::ExternalApi, api) => BaseUrlStrategy::ExternalApi(api.unwrap_or_default()),
        };
        let tile_kind = match self.tile_kind {
            TileKind::Vector => SourceKind::Vector,
            TileKind::Raster => SourceKind::Raster,
        };

        Config {
            port: self.port,
            tiles_root: self
                .tiles_root
                .unwrap_or_else(|| self.docs_root.join("tiles")),
            docs_root: self.docs_root,
            style_template: self.style,
            resolver: ResolverOptions {
                tile_kind,
                source_count: self.source_count as usize,
                credential_required: self.require_token,
                base_url_strategy,
            },
            environment: self.environment,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.environment.default_log_filter())),
        )
        .init();

    let server = TileServer::new(config)?;
    server.start().await
}

use crate::resolver::ResolverOptions;
use std::path::PathBuf;

/// Runtime environment. Only decides how chatty logging is by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "imaginary_map=debug,tower_http=debug,info",
            Environment::Production => "info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// General document root, served at `/`.
    pub docs_root: PathBuf,
    /// Tile tree, served gzip-negotiated at `/tiles/`.
    pub tiles_root: PathBuf,
    /// JSON style template; the built-in preset from `resolver` is used
    /// when absent.
    pub style_template: Option<PathBuf>,
    pub resolver: ResolverOptions,
    pub environment: Environment,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            docs_root: PathBuf::from("docs"),
            tiles_root: PathBuf::from("docs/tiles"),
            style_template: None,
            resolver: ResolverOptions::default(),
            environment: Environment::default(),
        }
    }
}

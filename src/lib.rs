pub mod config;
pub mod endpoints;
pub mod models;
pub mod resolver;
pub mod tiles;
pub mod utils;

pub use config::{Config, Environment};
pub use endpoints::server::TileServer;
pub use resolver::{ConfigurationError, StyleResolver};

pub mod coord;
pub mod inventory;

pub use coord::{TileCoord, TileCoordError};
pub use inventory::{TileInventory, ZoomStats, local_tile_dir};

use serde::Serialize;
use std::fmt;

/// Deepest zoom for which `x`/`y` still fit the tile grid in a `u32`.
pub const MAX_ZOOM: u8 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TileCoordError {
    #[error("'{0}' is not a tile coordinate")]
    NotANumber(String),
    #[error("negative tile coordinate {z}/{x}/{y}")]
    Negative { z: i64, x: i64, y: i64 },
    #[error("zoom {0} exceeds the maximum of {max}", max = MAX_ZOOM)]
    ZoomTooDeep(i64),
    #[error("tile {x}/{y} lies outside the {size}x{size} grid of zoom {z}")]
    OutOfRange { z: u8, x: u32, y: u32, size: u64 },
}

/// A validated XYZ tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, TileCoordError> {
        if z > MAX_ZOOM {
            return Err(TileCoordError::ZoomTooDeep(z as i64));
        }
        let size = 1u64 << z;
        if x as u64 >= size || y as u64 >= size {
            return Err(TileCoordError::OutOfRange { z, x, y, size });
        }
        Ok(TileCoord { z, x, y })
    }

    /// Accepts signed input, rejecting any negative component.
    pub fn from_signed(z: i64, x: i64, y: i64) -> Result<Self, TileCoordError> {
        if z < 0 || x < 0 || y < 0 {
            return Err(TileCoordError::Negative { z, x, y });
        }
        if z > MAX_ZOOM as i64 {
            return Err(TileCoordError::ZoomTooDeep(z));
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            let size = 1u64 << z;
            return Err(TileCoordError::OutOfRange {
                z: z as u8,
                x: x.min(u32::MAX as i64) as u32,
                y: y.min(u32::MAX as i64) as u32,
                size,
            });
        };
        Self::new(z as u8, x, y)
    }

    /// Parses `{z}`, `{x}` and `{y}.{ext}` path segments. Returns the
    /// coordinate and the extension (empty when the file has none).
    pub fn from_path_segments<'a>(
        z: &str,
        x: &str,
        file: &'a str,
    ) -> Result<(Self, &'a str), TileCoordError> {
        let (y, extension) = file.split_once('.').unwrap_or((file, ""));
        let coord = Self::from_signed(parse_segment(z)?, parse_segment(x)?, parse_segment(y)?)?;
        Ok((coord, extension))
    }

    /// Reads the trailing `{z}/{x}/{y}.{ext}` of a path below the tile root.
    ///
    /// Paths whose last two segments are not integers (metadata files,
    /// `tiles.json`, ...) yield `None`; a path that does end in integers is
    /// validated as a tile address.
    pub fn from_tile_path(path: &str) -> Result<Option<(Self, &str)>, TileCoordError> {
        let mut segments = path.trim_matches('/').rsplit('/');
        let (Some(file), Some(x), Some(z)) = (segments.next(), segments.next(), segments.next())
        else {
            return Ok(None);
        };
        let y = file.split_once('.').map_or(file, |(y, _)| y);
        if x.parse::<i64>().is_err() || y.parse::<i64>().is_err() {
            return Ok(None);
        }
        Self::from_path_segments(z, x, file).map(Some)
    }

    pub fn grid_size(&self) -> u64 {
        1u64 << self.z
    }
}

fn parse_segment(segment: &str) -> Result<i64, TileCoordError> {
    segment
        .parse()
        .map_err(|_| TileCoordError::NotANumber(segment.to_string()))
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

use super::coord::TileCoord;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// URL prefix under which the tiles directory is mounted.
pub const TILES_PREFIX: &str = "tiles/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoomStats {
    /// Distinct tile addresses found at this zoom.
    pub tiles: usize,
    /// Files carrying a precompressed `.gz` variant.
    pub gzipped: usize,
}

/// What a `{z}/{x}/{y}.{ext}` tile directory holds on disk.
#[derive(Debug, Clone, Default)]
pub struct TileInventory {
    pub root: PathBuf,
    pub total_bytes: u64,
    zooms: BTreeMap<u8, ZoomStats>,
}

impl TileInventory {
    /// Walks `root` three levels deep. Files that do not look like tiles are
    /// skipped; a missing directory yields an empty inventory.
    pub fn scan<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let mut seen: BTreeMap<u8, HashSet<TileCoord>> = BTreeMap::new();
        let mut zooms: BTreeMap<u8, ZoomStats> = BTreeMap::new();
        let mut total_bytes = 0u64;

        let entries = WalkDir::new(&root)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file());

        for entry in entries {
            let Some((coord, gzipped)) = tile_address(&root, entry.path()) else {
                debug!(path = %entry.path().display(), "skipping non-tile file");
                continue;
            };
            total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);

            let stats = zooms.entry(coord.z).or_default();
            if gzipped {
                stats.gzipped += 1;
            }
            if seen.entry(coord.z).or_default().insert(coord) {
                stats.tiles += 1;
            }
        }

        if zooms.is_empty() {
            warn!(root = %root.display(), "no tiles found");
        }

        TileInventory {
            root,
            total_bytes,
            zooms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zooms.is_empty()
    }

    pub fn total_tiles(&self) -> usize {
        self.zooms.values().map(|s| s.tiles).sum()
    }

    pub fn zoom_levels(&self) -> Vec<u8> {
        self.zooms.keys().copied().collect()
    }

    pub fn stats(&self, z: u8) -> Option<&ZoomStats> {
        self.zooms.get(&z)
    }

    /// Zoom levels in `min..=max` without a single tile on disk.
    pub fn missing_zooms(&self, min: u8, max: u8) -> Vec<u8> {
        (min..=max).filter(|z| !self.zooms.contains_key(z)).collect()
    }
}

fn tile_address(root: &Path, path: &Path) -> Option<(TileCoord, bool)> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = relative.iter().filter_map(|p| p.to_str());
    let (z, x, file) = (parts.next()?, parts.next()?, parts.next()?);
    let (file, gzipped) = match file.strip_suffix(".gz") {
        Some(stripped) => (stripped, true),
        None => (file, false),
    };
    let (coord, _) = TileCoord::from_path_segments(z, x, file).ok()?;
    Some((coord, gzipped))
}

/// Directory under `tiles_root` holding the tiles of a relative template
/// such as `tiles/islands/{z}/{x}/{y}.pbf`. `None` when the template does
/// not point into the local tiles mount.
pub fn local_tile_dir(template: &str, tiles_root: &Path) -> Option<PathBuf> {
    let rest = template.strip_prefix(TILES_PREFIX)?;
    let (prefix, _) = rest.split_once("{z}")?;
    Some(tiles_root.join(prefix.trim_end_matches('/')))
}

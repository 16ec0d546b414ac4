use crate::models::{SourceKind, StyleTemplate};
use crate::tiles::{TileInventory, local_tile_dir};
use comfy_table::{Attribute, Cell, CellAlignment, Table};
use std::path::{Path, PathBuf};

/// How one style source lines up with the tiles actually on disk.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,
    pub kind: SourceKind,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Local directory backing the source, `None` for remote templates.
    pub directory: Option<PathBuf>,
    pub tiles: usize,
    pub gzipped: usize,
    pub missing_zooms: Vec<u8>,
    pub unused_zooms: Vec<u8>,
}

impl SourceReport {
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let Some(directory) = &self.directory else {
            return warnings;
        };
        if self.tiles == 0 {
            warnings.push(format!(
                "  ⚠️{}: no tiles found under {}",
                self.name,
                directory.display()
            ));
            return warnings;
        }
        if !self.missing_zooms.is_empty() {
            warnings.push(format!(
                "  ⚠️{}: zoom levels {:?} are declared but have no tiles on disk",
                self.name, self.missing_zooms
            ));
        }
        if !self.unused_zooms.is_empty() {
            warnings.push(format!(
                "  ⚠️{}: tiles at zoom levels {:?} lie outside minzoom {}..maxzoom {} and are never requested",
                self.name, self.unused_zooms, self.min_zoom, self.max_zoom
            ));
        }
        warnings
    }
}

/// Scans the tile directory of every source whose template points into the
/// local tiles mount.
pub fn build_source_reports(
    template: &StyleTemplate,
    tiles_root: &Path,
    local: bool,
) -> Vec<SourceReport> {
    template
        .sources
        .iter()
        .map(|spec| {
            let directory = local
                .then(|| local_tile_dir(&spec.template, tiles_root))
                .flatten();
            let inventory = directory.as_ref().map(TileInventory::scan).unwrap_or_default();
            let unused_zooms = inventory
                .zoom_levels()
                .into_iter()
                .filter(|z| *z < spec.min_zoom || *z > spec.max_zoom)
                .collect();
            let (tiles, gzipped) = (spec.min_zoom..=spec.max_zoom)
                .filter_map(|z| inventory.stats(z))
                .fold((0, 0), |(t, g), s| (t + s.tiles, g + s.gzipped));

            SourceReport {
                name: spec.name.clone(),
                kind: spec.kind,
                min_zoom: spec.min_zoom,
                max_zoom: spec.max_zoom,
                missing_zooms: inventory.missing_zooms(spec.min_zoom, spec.max_zoom),
                directory,
                tiles,
                gzipped,
                unused_zooms,
            }
        })
        .collect()
}

pub fn print_style_summary(style_name: &str, reports: &[SourceReport], layer_count: usize) {
    let header = |title: &str| {
        Cell::new(title)
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Center)
    };

    let mut table = Table::new();
    table
        .set_header(vec![
            header(""),
            header("Source"),
            header("Type"),
            header("Zoom"),
            header("Tiles"),
            header("Gzipped"),
            Cell::new("Location").add_attribute(Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED);

    let mut warnings = Vec::new();
    for report in reports {
        let report_warnings = report.warnings();
        let status = if report_warnings.is_empty() { "✅" } else { "⚠️" };
        let kind = match report.kind {
            SourceKind::Vector => "vector",
            SourceKind::Raster => "raster",
        };
        let (tiles, gzipped, location) = match &report.directory {
            Some(dir) => (
                report.tiles.to_string(),
                report.gzipped.to_string(),
                dir.display().to_string(),
            ),
            None => ("-".to_string(), "-".to_string(), "remote".to_string()),
        };

        table.add_row(vec![
            Cell::new(status).set_alignment(CellAlignment::Center),
            Cell::new(&report.name),
            Cell::new(kind).set_alignment(CellAlignment::Center),
            Cell::new(format!("{}..{}", report.min_zoom, report.max_zoom))
                .set_alignment(CellAlignment::Center),
            Cell::new(tiles).set_alignment(CellAlignment::Center),
            Cell::new(gzipped).set_alignment(CellAlignment::Center),
            Cell::new(location),
        ]);
        warnings.extend(report_warnings);
    }

    println!(
        "\nStyle '{}' ({} sources, {} layers):\n{}",
        style_name,
        reports.len(),
        layer_count,
        table
    );

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("{}", warning);
        }
    }

    println!();
}

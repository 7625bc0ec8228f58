//! Batch export of a dashboard's charts to SVG files.

use crate::chart_export::write_chart_svg;
use crate::dashboard::Dashboard;
use crate::selection::Selection;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files written by [`export_dashboard`].
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub svg_files: Vec<PathBuf>,
    pub panels_json: PathBuf,
}

/// Render every panel of `dashboard` for `selection` into `out_dir`.
///
/// Each SVG-capable chart becomes `<key>.svg`; every panel output, cards and
/// JSON-only charts included, is written to `panels.json`.
pub fn export_dashboard(
    dashboard: &dyn Dashboard,
    selection: &Selection,
    out_dir: &Path,
) -> Result<ExportSummary> {
    fs::create_dir_all(out_dir)
        .map_err(|e| eyre!("Could not create {}: {}", out_dir.display(), e))?;

    let outputs = dashboard.render_all(selection)?;
    let mut summary = ExportSummary::default();
    for panel in dashboard.panels() {
        if !panel.renders_to_svg() {
            continue;
        }
        let Some(spec) = outputs.get(panel.key).and_then(|o| o.as_chart()) else {
            continue;
        };
        let path = out_dir.join(format!("{}.svg", panel.key));
        write_chart_svg(&path, spec)?;
        debug!(path = %path.display(), "wrote chart");
        summary.svg_files.push(path);
    }

    summary.panels_json = out_dir.join("panels.json");
    fs::write(&summary.panels_json, serde_json::to_string_pretty(&outputs)?)?;

    info!(
        dashboard = dashboard.id(),
        selection = selection.label(),
        charts = summary.svg_files.len(),
        out = %out_dir.display(),
        "export complete"
    );
    Ok(summary)
}

//! Persistence layer.
//!
//! Saves and loads the analysis report to/from a JSON file. Rendering
//! (charts, CSV) consumes this file and lives outside the crate.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::bankroll::SurvivalTable;
use crate::analysis::metrics::{CareerTotals, MetricPoint, MetricsSeries, ReturnPoint};
use crate::ingest::SkippedFile;

/// Everything one analysis run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub totals: CareerTotals,
    /// Metrics at the most recent tournament.
    pub latest: Option<MetricPoint>,
    pub windows: Vec<usize>,
    /// Downsampled history for the performance charts.
    pub series: Vec<MetricPoint>,
    /// One point per non-freeroll tournament for the prize scatter.
    pub return_points: Vec<ReturnPoint>,
    /// `None` when there was nothing to simulate.
    pub survival: Option<SurvivalTable>,
    pub skipped: Vec<SkippedFile>,
}

impl AnalysisReport {
    pub fn new(totals: CareerTotals) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            totals,
            latest: None,
            windows: Vec::new(),
            series: Vec::new(),
            return_points: Vec::new(),
            survival: None,
            skipped: Vec::new(),
        }
    }

    /// Attach the metric history, keeping at most `max_points` points.
    /// The most recent point is always stored in full as `latest`.
    pub fn set_series(&mut self, series: &MetricsSeries, max_points: usize) {
        self.windows = series.windows.clone();
        self.latest = series.last().cloned();
        self.series = series.downsample(max_points).into_iter().cloned().collect();
    }
}

/// Save a report as pretty JSON.
pub fn save_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialise analysis report")?;

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    debug!(path = %path.display(), run_id = %report.run_id, "Report saved");
    Ok(())
}

/// Load a report. Returns None if the file doesn't exist.
pub fn load_report(path: &Path) -> Result<Option<AnalysisReport>> {
    if !path.exists() {
        info!(path = %path.display(), "No saved report found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report from {}", path.display()))?;

    let report: AnalysisReport = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse report from {}", path.display()))?;

    info!(
        path = %path.display(),
        run_id = %report.run_id,
        tournaments = report.totals.tournaments,
        "Report loaded from disk"
    );

    Ok(Some(report))
}

/// Delete the report file (for testing or reset).
pub fn delete_report(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete report {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

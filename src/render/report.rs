use crate::model::{IngestStats, Profile};
use crate::view::Plots;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    /// Every progress point in the profile (legend order).
    pub progress_points: Vec<String>,
    pub disabled: Vec<String>,
    pub stats: IngestStats,
    pub plots: Plots,
}

pub fn build_report_data(profile: &Profile, plots: Plots) -> ReportData {
    ReportData {
        progress_points: profile.progress_points().to_vec(),
        disabled: profile.disabled_progress_points().iter().cloned().collect(),
        stats: profile.stats().clone(),
        plots,
    }
}

/// Serialize the report as pretty-printed JSON.
pub fn render_json_report(data: &ReportData) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

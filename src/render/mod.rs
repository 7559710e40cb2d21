//! Output for the command-line shell: a JSON report for chart renderers and
//! a plain-text summary.

pub mod report;
pub mod text;

pub use report::{build_report_data, render_json_report, ReportData};
pub use text::render_text_summary;

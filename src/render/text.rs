use crate::render::report::ReportData;
use std::fmt::Write;

/// Render a compact text table: one block per plotted location, one row per
/// speedup level of each progress point that has measurements.
pub fn render_text_summary(data: &ReportData) -> anyhow::Result<String> {
    let mut out = String::new();
    let plots = &data.plots;

    writeln!(
        out,
        "{} location(s) plotted (min points {}, sorted {:?})",
        plots.results.len(),
        plots.min_points,
        plots.sort
    )?;
    write!(out, "progress points: {}", data.progress_points.join(", "))?;
    if !data.disabled.is_empty() {
        write!(out, " (disabled: {})", data.disabled.join(", "))?;
    }
    writeln!(out)?;
    if let Some(range) = plots.range {
        writeln!(
            out,
            "progress speedup range: {:+.1}% .. {:+.1}%",
            range.min * 100.0,
            range.max * 100.0
        )?;
    }

    for result in &plots.results {
        writeln!(out)?;
        writeln!(out, "{}", result.name)?;
        for point in &result.progress_points {
            if point.measurements.is_empty() {
                continue;
            }
            writeln!(out, "  {}", point.name)?;
            writeln!(out, "    {:>8}  {:>9}", "speedup", "progress")?;
            for m in &point.measurements {
                writeln!(
                    out,
                    "    {:>8}  {:>+8.1}%",
                    m.speedup,
                    m.progress_speedup * 100.0
                )?;
            }
        }
    }

    Ok(out)
}

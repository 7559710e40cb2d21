//! View projections over estimator output: plot ordering, axis range,
//! automatic minimum-points relaxation, and the `Viewer` session that ties a
//! loaded profile to its host callbacks.

use crate::error::Result;
use crate::model::{Profile, SpeedupResult, ToggleOutcome, WarningSink};
use serde::Serialize;
use std::cmp::Ordering;

/// Supplies the current minimum-points threshold (e.g. a UI slider).
pub trait MinPointsSource {
    fn min_points(&self) -> usize;
}

impl<F: Fn() -> usize> MinPointsSource for F {
    fn min_points(&self) -> usize {
        self()
    }
}

/// How plots are ordered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// By location name.
    #[default]
    Alphabetical,
    /// Largest normalized area under any progress speedup curve first.
    Impact,
    /// Largest progress speedup first.
    MaxSpeedup,
    /// Most negative progress speedup first.
    MinSpeedup,
}

/// Largest area under a curve, normalized by the speedup range it covers.
pub fn max_normalized_area(result: &SpeedupResult) -> f64 {
    let mut best = 0.0f64;
    for point in &result.progress_points {
        let mut area = 0.0;
        for pair in point.measurements.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            let avg = (prev.progress_speedup + cur.progress_speedup) / 2.0;
            area += avg * (cur.speedup - prev.speedup);
            let normalized = area / cur.speedup;
            if normalized > best {
                best = normalized;
            }
        }
    }
    best
}

/// Largest progress speedup, never below 0.
pub fn max_progress_speedup(result: &SpeedupResult) -> f64 {
    measurements(result).fold(0.0, f64::max)
}

/// Smallest progress speedup, never above 0.
pub fn min_progress_speedup(result: &SpeedupResult) -> f64 {
    measurements(result).fold(0.0, f64::min)
}

fn measurements(result: &SpeedupResult) -> impl Iterator<Item = f64> + '_ {
    result
        .progress_points
        .iter()
        .flat_map(|p| p.measurements.iter().map(|m| m.progress_speedup))
}

/// Sort plots in place. Ties fall back to location name.
pub fn sort_results(results: &mut [SpeedupResult], order: SortOrder) {
    match order {
        SortOrder::Alphabetical => results.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Impact => results.sort_by(|a, b| compare_by(a, b, max_normalized_area, true)),
        SortOrder::MaxSpeedup => {
            results.sort_by(|a, b| compare_by(a, b, max_progress_speedup, true))
        }
        SortOrder::MinSpeedup => {
            results.sort_by(|a, b| compare_by(a, b, min_progress_speedup, false))
        }
    }
}

fn compare_by(
    a: &SpeedupResult,
    b: &SpeedupResult,
    key: fn(&SpeedupResult) -> f64,
    descending: bool,
) -> Ordering {
    let ord = key(a).total_cmp(&key(b));
    let ord = if descending { ord.reverse() } else { ord };
    ord.then_with(|| a.name.cmp(&b.name))
}

/// Shared y-axis bounds for a set of plots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedupRange {
    pub min: f64,
    pub max: f64,
}

/// Global progress speedup range across all plots, padded by 5% so edge
/// points stay visible. None when there is nothing to plot.
pub fn progress_speedup_range(results: &[SpeedupResult]) -> Option<SpeedupRange> {
    if results.is_empty() {
        return None;
    }
    let min = results.iter().map(min_progress_speedup).fold(f64::INFINITY, f64::min);
    let max = results
        .iter()
        .map(max_progress_speedup)
        .fold(f64::NEG_INFINITY, f64::max);
    Some(SpeedupRange {
        min: min * 1.05,
        max: max * 1.05,
    })
}

/// Largest threshold `<= requested` (and at least 1) that still yields a
/// plot. Falls back to `requested` when no threshold does.
pub fn relax_min_points(profile: &Profile, requested: usize) -> usize {
    (1..=requested)
        .rev()
        .find(|&n| profile.count_plots(n) > 0)
        .unwrap_or(requested)
}

/// One computed set of plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plots {
    pub min_points: usize,
    pub sort: SortOrder,
    pub range: Option<SpeedupRange>,
    pub results: Vec<SpeedupResult>,
}

/// A loaded profile together with its host collaborators.
pub struct Viewer {
    profile: Profile,
    warnings: Box<dyn WarningSink>,
    min_points: Box<dyn MinPointsSource>,
    sort: SortOrder,
    auto_relax: bool,
}

impl Viewer {
    pub fn load(
        text: &str,
        mut warnings: Box<dyn WarningSink>,
        min_points: Box<dyn MinPointsSource>,
    ) -> Result<Self> {
        let profile = Profile::parse(text, warnings.as_mut())?;
        Ok(Viewer {
            profile,
            warnings,
            min_points,
            sort: SortOrder::default(),
            auto_relax: false,
        })
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Lower the threshold automatically when it would leave nothing to plot.
    pub fn with_auto_relax(mut self, auto_relax: bool) -> Self {
        self.auto_relax = auto_relax;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn toggle_progress_point(&mut self, point: &str) -> ToggleOutcome {
        self.profile
            .toggle_progress_point(point, self.warnings.as_mut())
    }

    /// Recompute plots, reading the minimum-points source afresh.
    pub fn refresh(&self) -> Plots {
        let requested = self.min_points.min_points();
        let min_points = if self.auto_relax && self.profile.count_plots(requested) == 0 {
            relax_min_points(&self.profile, requested)
        } else {
            requested
        };

        let mut results = self.profile.speedup_data(min_points);
        sort_results(&mut results, self.sort);
        Plots {
            min_points,
            sort: self.sort,
            range: progress_speedup_range(&results),
            results,
        }
    }
}

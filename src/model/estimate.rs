//! Speedup estimation: turn aggregated experiment data into baseline-relative
//! progress speedup curves, one per (location, progress point).

use crate::location::Location;
use crate::model::{ExperimentData, Profile, Series, SpeedupLevel};
use serde::Serialize;

/// Minimum progress point visits (or arrivals) for an entry to be trusted.
/// Matches the profiler's own per-experiment target delta.
pub const MIN_DELTA: i64 = 5;

/// Progress speedups outside this band are treated as noise and dropped.
pub const PROGRESS_SPEEDUP_BOUNDS: (f64, f64) = (-1.0, 2.0);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub speedup: f64,
    pub progress_speedup: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeries {
    pub name: String,
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedupResult {
    pub name: Location,
    pub progress_points: Vec<PointSeries>,
}

/// Infinity comes from dividing by zero; NaN from corrupt inputs.
pub fn is_valid_data_point(value: f64) -> bool {
    value.is_finite()
}

pub fn has_enough_data(data: &ExperimentData) -> bool {
    match data {
        ExperimentData::Throughput { delta, .. } => *delta >= MIN_DELTA,
        ExperimentData::Latency { arrivals, .. } => *arrivals >= MIN_DELTA,
    }
}

/// Scalar compared across speedup levels: mean period between visits for
/// throughput points, mean latency (Little's Law) for latency points.
pub fn data_point(data: &ExperimentData) -> f64 {
    if data.duration() < 0 {
        return f64::NAN;
    }
    match data {
        ExperimentData::Throughput { delta, duration } => *duration as f64 / *delta as f64,
        ExperimentData::Latency {
            arrivals,
            difference,
            duration,
            ..
        } => {
            let arrival_rate = *arrivals as f64 / *duration as f64;
            difference / arrival_rate
        }
    }
}

/// Throughput points are maximized; latency points are minimized.
pub fn should_maximize(data: &ExperimentData) -> bool {
    match data {
        ExperimentData::Throughput { .. } => true,
        ExperimentData::Latency { .. } => false,
    }
}

/// Compute progress speedup curves for every location.
///
/// Each returned location lists every enabled progress point in sorted order;
/// points without at least `min_points` usable measurements are present with
/// an empty list. Locations where no point reached `min_points` are omitted.
pub fn speedup_data(profile: &Profile, min_points: usize) -> Vec<SpeedupResult> {
    let enabled = profile.enabled_progress_points();
    let mut result = Vec::new();

    for (location, points) in profile.locations() {
        let mut progress_points = Vec::with_capacity(enabled.len());
        let mut points_with_enough = 0usize;

        for name in &enabled {
            let measurements = points
                .get(*name)
                .and_then(measure_series)
                .filter(|m| m.len() >= min_points);

            if measurements.is_some() {
                points_with_enough += 1;
            }
            progress_points.push(PointSeries {
                name: name.to_string(),
                measurements: measurements.unwrap_or_default(),
            });
        }

        if points_with_enough > 0 {
            result.push(SpeedupResult {
                name: location.clone(),
                progress_points,
            });
        }
    }

    result
}

/// Measurements for one series, or None when there is no usable baseline.
fn measure_series(series: &Series) -> Option<Vec<Measurement>> {
    let baseline = series
        .get(&SpeedupLevel::BASELINE)
        .filter(|b| has_enough_data(b))?;
    let baseline_point = data_point(baseline);
    if !is_valid_data_point(baseline_point) {
        return None;
    }
    let maximize = should_maximize(baseline);
    let (low, high) = PROGRESS_SPEEDUP_BOUNDS;

    let mut measurements: Vec<Measurement> = series
        .iter()
        .filter(|(_, data)| has_enough_data(data))
        .filter_map(|(level, data)| {
            let value = data_point(data);
            if !is_valid_data_point(value) {
                return None;
            }
            let mut progress_speedup = (baseline_point - value) / baseline_point;
            if !maximize {
                progress_speedup = -progress_speedup;
            }
            (low..=high)
                .contains(&progress_speedup)
                .then_some(Measurement {
                    speedup: level.value(),
                    progress_speedup,
                })
        })
        .collect();

    measurements.sort_by(|a, b| a.speedup.total_cmp(&b.speedup));
    Some(measurements)
}

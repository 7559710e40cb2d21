//! Accumulated statistics for one (location, progress point, speedup level).

use crate::error::AccumulateError;
use crate::log::{Experiment, LatencyPoint, ThroughputPoint};
use serde::Serialize;
use std::cmp::Ordering;

/// Speedup applied during an experiment, used as a map key.
///
/// The profiler writes speedups as fractions (`0.05`, `0.5`), older and
/// hand-written logs as percentages; either way the value is kept exactly.
#[derive(Debug, Clone, Copy)]
pub struct SpeedupLevel(f64);

impl SpeedupLevel {
    pub const BASELINE: SpeedupLevel = SpeedupLevel(0.0);

    pub fn new(speedup: f64) -> Self {
        // Fold -0.0 into 0.0 so both hit the baseline.
        SpeedupLevel(speedup + 0.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for SpeedupLevel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SpeedupLevel {}

impl PartialOrd for SpeedupLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SpeedupLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for SpeedupLevel {
    fn from(speedup: f64) -> Self {
        SpeedupLevel::new(speedup)
    }
}

/// Which kind of progress point populated a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Throughput,
    Latency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExperimentData {
    /// Cumulative visits and cumulative experiment time.
    Throughput { delta: i64, duration: i64 },
    /// Cumulative arrivals/departures; `difference` is a duration-weighted
    /// running average, not a sum.
    Latency {
        arrivals: i64,
        departures: i64,
        difference: f64,
        duration: i64,
    },
}

impl ExperimentData {
    pub fn empty(kind: PointKind) -> Self {
        match kind {
            PointKind::Throughput => ExperimentData::Throughput {
                delta: 0,
                duration: 0,
            },
            PointKind::Latency => ExperimentData::Latency {
                arrivals: 0,
                departures: 0,
                difference: 0.0,
                duration: 0,
            },
        }
    }

    pub fn kind(&self) -> PointKind {
        match self {
            ExperimentData::Throughput { .. } => PointKind::Throughput,
            ExperimentData::Latency { .. } => PointKind::Latency,
        }
    }

    pub fn duration(&self) -> i64 {
        match self {
            ExperimentData::Throughput { duration, .. }
            | ExperimentData::Latency { duration, .. } => *duration,
        }
    }

    /// Fold one throughput observation in. Leaves the entry untouched on
    /// error.
    pub(crate) fn add_throughput(
        &mut self,
        experiment: &Experiment,
        point: &ThroughputPoint,
    ) -> Result<(), AccumulateError> {
        let ExperimentData::Throughput { delta, duration } = self else {
            return Err(AccumulateError::KindMismatch {
                expected: PointKind::Latency,
                found: PointKind::Throughput,
            });
        };
        let new_delta = checked_sum(*delta, point.delta)?;
        let new_duration = checked_sum(*duration, experiment.duration)?;
        *delta = new_delta;
        *duration = new_duration;
        Ok(())
    }

    /// Fold one latency observation in. Leaves the entry untouched on error.
    pub(crate) fn add_latency(
        &mut self,
        experiment: &Experiment,
        point: &LatencyPoint,
    ) -> Result<(), AccumulateError> {
        let ExperimentData::Latency {
            arrivals,
            departures,
            difference,
            duration,
        } = self
        else {
            return Err(AccumulateError::KindMismatch {
                expected: PointKind::Throughput,
                found: PointKind::Latency,
            });
        };
        let new_arrivals = checked_sum(*arrivals, point.arrivals)?;
        let new_departures = checked_sum(*departures, point.departures)?;
        let new_duration = checked_sum(*duration, experiment.duration)?;

        if *duration == 0 {
            *difference = point.difference as f64;
        } else {
            let total = new_duration as f64;
            // Shrinking weight is near 1: divide first.
            *difference *= *duration as f64 / total;
            // Growing weight is near 0: multiply first.
            *difference += (point.difference as f64 * experiment.duration as f64) / total;
        }

        *arrivals = new_arrivals;
        *departures = new_departures;
        *duration = new_duration;
        Ok(())
    }
}

fn checked_sum(a: i64, b: i64) -> Result<i64, AccumulateError> {
    a.checked_add(b).ok_or(AccumulateError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use pretty_assertions::assert_eq;

    fn experiment(duration: i64) -> Experiment {
        Experiment {
            selected: Location::from("a.c:1"),
            speedup: 0.0,
            duration,
        }
    }

    fn latency(difference: i64) -> LatencyPoint {
        LatencyPoint {
            name: "q".to_string(),
            arrivals: 10,
            departures: 9,
            difference,
        }
    }

    #[test]
    fn throughput_accumulates() {
        let exp = experiment(1000);
        let point = ThroughputPoint {
            name: "p".to_string(),
            delta: 100,
            point_type: None,
        };
        let mut data = ExperimentData::empty(PointKind::Throughput);
        data.add_throughput(&exp, &point).unwrap();
        data.add_throughput(&exp, &point).unwrap();
        assert_eq!(
            data,
            ExperimentData::Throughput {
                delta: 200,
                duration: 2000
            }
        );
    }

    #[test]
    fn first_latency_observation_overwrites_difference() {
        let mut data = ExperimentData::empty(PointKind::Latency);
        data.add_latency(&experiment(100), &latency(6)).unwrap();
        assert_eq!(
            data,
            ExperimentData::Latency {
                arrivals: 10,
                departures: 9,
                difference: 6.0,
                duration: 100
            }
        );
    }

    #[test]
    fn latency_difference_is_duration_weighted() {
        let mut data = ExperimentData::empty(PointKind::Latency);
        data.add_latency(&experiment(100), &latency(4)).unwrap();
        data.add_latency(&experiment(300), &latency(8)).unwrap();
        match data {
            ExperimentData::Latency {
                arrivals,
                difference,
                duration,
                ..
            } => {
                assert_eq!(arrivals, 20);
                assert_eq!(duration, 400);
                // (4 * 100 + 8 * 300) / 400
                assert!((difference - 7.0).abs() < 1e-12);
            }
            other => panic!("unexpected data {:?}", other),
        }
    }

    #[test]
    fn mismatched_update_is_rejected() {
        let mut data = ExperimentData::empty(PointKind::Throughput);
        let err = data.add_latency(&experiment(100), &latency(4)).unwrap_err();
        assert_eq!(
            err,
            AccumulateError::KindMismatch {
                expected: PointKind::Throughput,
                found: PointKind::Latency
            }
        );
        assert_eq!(data, ExperimentData::empty(PointKind::Throughput));
    }

    #[test]
    fn overflowing_counters_leave_entry_untouched() {
        let exp = experiment(1000);
        let point = ThroughputPoint {
            name: "p".to_string(),
            delta: 9_223_372_036_854_775_000,
            point_type: None,
        };
        let mut data = ExperimentData::empty(PointKind::Throughput);
        data.add_throughput(&exp, &point).unwrap();
        assert_eq!(
            data.add_throughput(&exp, &point),
            Err(AccumulateError::Overflow)
        );
        assert_eq!(
            data,
            ExperimentData::Throughput {
                delta: 9_223_372_036_854_775_000,
                duration: 1000
            }
        );

        let mut queue = ExperimentData::empty(PointKind::Latency);
        queue.add_latency(&experiment(i64::MAX), &latency(4)).unwrap();
        assert_eq!(
            queue.add_latency(&experiment(1), &latency(4)),
            Err(AccumulateError::Overflow)
        );
        assert_eq!(queue.duration(), i64::MAX);
    }
}

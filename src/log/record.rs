use crate::location::Location;
use serde::Deserialize;

/// One randomized experiment: `selected` was virtually sped up by `speedup`
/// percent for `duration` time units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Experiment {
    pub selected: Location,
    pub speedup: f64,
    pub duration: i64,
}

impl Experiment {
    pub(crate) fn check_speedup(&self) -> Result<(), String> {
        if self.speedup.is_finite() && (0.0..=100.0).contains(&self.speedup) {
            Ok(())
        } else {
            Err(format!("speedup {} is outside 0..=100", self.speedup))
        }
    }
}

/// Visits of a throughput progress point during the enclosing experiment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThroughputPoint {
    pub name: String,
    pub delta: i64,
    /// Profiler-side point flavour (`source`, `end-to-end`, ...), if given.
    #[serde(rename = "point-type", default)]
    pub point_type: Option<String>,
}

/// Queueing counters of a latency progress point during the enclosing experiment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatencyPoint {
    pub name: String,
    pub arrivals: i64,
    pub departures: i64,
    pub difference: i64,
}

/// Informational lines with no effect on aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredKind {
    Startup,
    Shutdown,
    Samples,
    Runtime,
}

impl IgnoredKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoredKind::Startup => "startup",
            IgnoredKind::Shutdown => "shutdown",
            IgnoredKind::Samples => "samples",
            IgnoredKind::Runtime => "runtime",
        }
    }
}

/// A single typed line of a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Experiment(Experiment),
    Throughput(ThroughputPoint),
    Latency(LatencyPoint),
    Ignored(IgnoredKind),
    /// A line whose kind is not one the viewer understands.
    Unknown { kind: String },
}

/// Record kind named by the first field (or the JSON `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Experiment,
    Throughput,
    Latency,
    Ignored(IgnoredKind),
}

impl Kind {
    pub(crate) fn from_tag(tag: &str) -> Option<Kind> {
        Some(match tag {
            "experiment" => Kind::Experiment,
            "throughput-point" | "progress-point" | "throughput_point" => Kind::Throughput,
            "latency-point" => Kind::Latency,
            "startup" => Kind::Ignored(IgnoredKind::Startup),
            "shutdown" => Kind::Ignored(IgnoredKind::Shutdown),
            "samples" => Kind::Ignored(IgnoredKind::Samples),
            "runtime" => Kind::Ignored(IgnoredKind::Runtime),
            _ => return None,
        })
    }
}

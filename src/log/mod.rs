//! Line parsing for causal profiler experiment logs.

pub mod parse;
pub mod record;

pub use parse::{parse_line, parse_profile_text};
pub use record::{Experiment, IgnoredKind, LatencyPoint, Record, ThroughputPoint};

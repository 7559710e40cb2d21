//! Error types for profile parsing and aggregation.
//!
//! Only two things abort ingestion: a JSON line that is not valid JSON (or
//! whose shape does not match its record type), and a progress point that is
//! fed both throughput and latency measurements. Everything else, including
//! a point whose counters would overflow, is reported through the warning
//! sink and skipped.

use crate::location::Location;
use crate::model::PointKind;
use thiserror::Error;

/// Failure to turn one raw line into a record.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed JSON line: {0}")]
    Json(#[source] serde_json::Error),

    #[error("JSON record of type {kind:?} has the wrong shape: {source}")]
    Record {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} line: {problem}")]
    Field { kind: String, problem: String },
}

impl ParseError {
    /// Key-value field problems are recoverable; JSON problems are not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParseError::Field { .. })
    }

    /// Record kind of the failing line, when known.
    pub fn kind(&self) -> Option<&str> {
        match self {
            ParseError::Json(_) => None,
            ParseError::Record { kind, .. } | ParseError::Field { kind, .. } => Some(kind),
        }
    }
}

/// Failure to fold one point record into an accumulated entry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulateError {
    #[error("a {found:?} point cannot update {expected:?} data")]
    KindMismatch {
        expected: PointKind,
        found: PointKind,
    },

    #[error("counter overflow")]
    Overflow,
}

/// Failure to build a [`crate::model::Profile`].
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error(
        "progress point {point:?} at {location} received both throughput and latency measurements"
    )]
    MixedPointKinds { location: Location, point: String },

    #[error("progress point {point:?} at {location}: counters overflow")]
    CounterOverflow { location: Location, point: String },
}

impl ProfileError {
    /// Overflowing counters only spoil one line; the rest abort ingestion.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProfileError::CounterOverflow { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;

//! Causal profile viewer core: parse profiler experiment logs, aggregate
//! repeated speedup experiments, and estimate per-location progress speedup
//! curves for rendering.

pub mod error;
pub mod location;
pub mod log;
pub mod model;
pub mod render;
pub mod view;

pub use error::{AccumulateError, ParseError, ProfileError};
pub use location::Location;
pub use model::{Profile, StderrWarnings, ToggleOutcome, WarningSink};
pub use view::{MinPointsSource, SortOrder, Viewer};

//! Aggregation model: fold parsed experiment records into per-location,
//! per-progress-point, per-speedup-level statistics.

pub mod data;
pub mod estimate;

pub use data::{ExperimentData, PointKind, SpeedupLevel};
pub use estimate::{Measurement, PointSeries, SpeedupResult};

use crate::error::{AccumulateError, ProfileError, Result};
use crate::location::Location;
use crate::log::{parse_profile_text, Experiment, LatencyPoint, Record, ThroughputPoint};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Aggregated data for one (location, progress point), keyed by speedup level.
pub type Series = BTreeMap<SpeedupLevel, ExperimentData>;

/// Receives user-facing warnings (title + human-readable message).
pub trait WarningSink {
    fn display_warning(&mut self, title: &str, message: &str);
}

impl<F: FnMut(&str, &str)> WarningSink for F {
    fn display_warning(&mut self, title: &str, message: &str) {
        self(title, message)
    }
}

/// Prints warnings to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrWarnings;

impl WarningSink for StderrWarnings {
    fn display_warning(&mut self, title: &str, message: &str) {
        eprintln!("WARN: {}: {}", title, message);
    }
}

/// Line counts gathered while ingesting a profile.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub lines: usize,
    pub experiments: usize,
    pub throughput_points: usize,
    pub latency_points: usize,
    pub ignored: usize,
    pub unknown: usize,
    pub malformed: usize,
    /// Point records seen before any experiment record.
    pub orphaned_points: usize,
}

/// Result of toggling a progress point's visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Enabled,
    Disabled,
    /// Refused: it was the last enabled point.
    Rejected,
    /// No such progress point in this profile.
    Unknown,
}

#[derive(Debug, Default, Clone)]
pub struct Profile {
    data: BTreeMap<Location, BTreeMap<String, Series>>,
    progress_points: OnceCell<Vec<String>>,
    disabled: BTreeSet<String>,
    stats: IngestStats,
}

impl Profile {
    /// Build a profile from the full text of a profiler log.
    ///
    /// Recoverable problems (unknown record kinds, malformed key-value lines,
    /// a log with no experiments) go to `warnings`; malformed JSON lines and
    /// mixed throughput/latency series abort with an error.
    pub fn parse(text: &str, warnings: &mut dyn WarningSink) -> Result<Profile> {
        let mut profile = Profile::default();
        let mut experiment: Option<Experiment> = None;

        for (lineno, line, parsed) in parse_profile_text(text) {
            profile.stats.lines += 1;

            let record = match parsed {
                Ok(record) => record,
                Err(e) if e.is_fatal() => {
                    return Err(ProfileError::Parse {
                        line: lineno,
                        source: e,
                    });
                }
                Err(e) => {
                    // Points after a broken experiment line have no valid context.
                    if e.kind() == Some("experiment") {
                        experiment = None;
                    }
                    profile.stats.malformed += 1;
                    warn!(line = lineno, error = %e, "skipping malformed profile line");
                    warnings.display_warning(
                        "Invalid Profile",
                        &format!("Line {} of the profile could not be read ({}): {}", lineno, e, line),
                    );
                    continue;
                }
            };

            match record {
                Record::Ignored(kind) => {
                    profile.stats.ignored += 1;
                    debug!(line = lineno, kind = kind.as_str(), "ignoring informational line");
                }
                Record::Experiment(e) => {
                    profile.stats.experiments += 1;
                    experiment = Some(e);
                }
                Record::Throughput(point) => match &experiment {
                    Some(e) => {
                        let added = profile.add_throughput_measurement(e, &point);
                        if profile.settle(added, lineno, line, warnings)? {
                            profile.stats.throughput_points += 1;
                        }
                    }
                    None => profile.orphan(lineno, &point.name),
                },
                Record::Latency(point) => match &experiment {
                    Some(e) => {
                        let added = profile.add_latency_measurement(e, &point);
                        if profile.settle(added, lineno, line, warnings)? {
                            profile.stats.latency_points += 1;
                        }
                    }
                    None => profile.orphan(lineno, &point.name),
                },
                Record::Unknown { kind } => {
                    profile.stats.unknown += 1;
                    debug!(line = lineno, kind = %kind, "unknown record kind");
                    warnings.display_warning(
                        "Invalid Profile",
                        &format!("The profile you loaded contains an invalid line: {}", line),
                    );
                }
            }
        }

        if profile.stats.experiments == 0 {
            warnings.display_warning(
                "Empty Profile",
                "The profile you loaded does not contain results from any performance experiments. \
                 Make sure you specified a progress point, built your program with debug information, \
                 and ran your program on an input that took at least a few seconds.",
            );
        }

        debug!(stats = ?profile.stats, "profile ingested");
        Ok(profile)
    }

    /// Turn the outcome of one accumulate call into "was it counted", warning
    /// about overflowing lines and passing fatal errors through.
    fn settle(
        &mut self,
        added: Result<()>,
        lineno: usize,
        line: &str,
        warnings: &mut dyn WarningSink,
    ) -> Result<bool> {
        match added {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.stats.malformed += 1;
                warn!(line = lineno, error = %e, "skipping profile line");
                warnings.display_warning(
                    "Invalid Profile",
                    &format!("Line {} of the profile could not be read ({}): {}", lineno, e, line),
                );
                Ok(false)
            }
        }
    }

    fn orphan(&mut self, lineno: usize, point: &str) {
        self.stats.orphaned_points += 1;
        debug!(line = lineno, point, "dropping progress point outside any experiment");
    }

    pub fn add_throughput_measurement(
        &mut self,
        experiment: &Experiment,
        point: &ThroughputPoint,
    ) -> Result<()> {
        self.ensure_entry(experiment, &point.name, PointKind::Throughput)?
            .add_throughput(experiment, point)
            .map_err(|e| accumulate_error(e, experiment, &point.name))
    }

    pub fn add_latency_measurement(
        &mut self,
        experiment: &Experiment,
        point: &LatencyPoint,
    ) -> Result<()> {
        self.ensure_entry(experiment, &point.name, PointKind::Latency)?
            .add_latency(experiment, point)
            .map_err(|e| accumulate_error(e, experiment, &point.name))
    }

    /// Look up or create the entry for (selected, point, speedup level).
    fn ensure_entry(
        &mut self,
        experiment: &Experiment,
        point: &str,
        kind: PointKind,
    ) -> Result<&mut ExperimentData> {
        self.progress_points.take();

        let series = self
            .data
            .entry(experiment.selected.clone())
            .or_default()
            .entry(point.to_string())
            .or_default();

        if let Some(existing) = series.values().next() {
            if existing.kind() != kind {
                return Err(ProfileError::MixedPointKinds {
                    location: experiment.selected.clone(),
                    point: point.to_string(),
                });
            }
        }

        Ok(series
            .entry(SpeedupLevel::new(experiment.speedup))
            .or_insert_with(|| ExperimentData::empty(kind)))
    }

    /// Selected locations with their per-point series, in location order.
    pub fn locations(&self) -> impl Iterator<Item = (&Location, &BTreeMap<String, Series>)> {
        self.data.iter()
    }

    pub fn series(&self, location: &Location, point: &str) -> Option<&Series> {
        self.data.get(location)?.get(point)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// All progress point names across all locations, sorted.
    pub fn progress_points(&self) -> &[String] {
        self.progress_points.get_or_init(|| {
            let names: BTreeSet<&String> =
                self.data.values().flat_map(|points| points.keys()).collect();
            names.into_iter().cloned().collect()
        })
    }

    pub fn enabled_progress_points(&self) -> Vec<&str> {
        self.progress_points()
            .iter()
            .filter(|p| !self.disabled.contains(p.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn disabled_progress_points(&self) -> &BTreeSet<String> {
        &self.disabled
    }

    pub fn is_disabled(&self, point: &str) -> bool {
        self.disabled.contains(point)
    }

    /// Flip a progress point between enabled and disabled. The last enabled
    /// point can never be disabled.
    pub fn toggle_progress_point(
        &mut self,
        point: &str,
        warnings: &mut dyn WarningSink,
    ) -> ToggleOutcome {
        if self.disabled.remove(point) {
            return ToggleOutcome::Enabled;
        }

        let known = self.progress_points();
        if !known.iter().any(|p| p == point) {
            warn!(point, "cannot toggle unknown progress point");
            return ToggleOutcome::Unknown;
        }

        if self.disabled.len() + 1 < known.len() {
            self.disabled.insert(point.to_string());
            ToggleOutcome::Disabled
        } else {
            warnings.display_warning("Warning", "At least one progress point must be enabled.");
            ToggleOutcome::Rejected
        }
    }

    /// Baseline-relative speedup curves; see [`estimate::speedup_data`].
    pub fn speedup_data(&self, min_points: usize) -> Vec<SpeedupResult> {
        estimate::speedup_data(self, min_points)
    }

    /// Number of locations that would be plotted at `min_points`.
    pub fn count_plots(&self, min_points: usize) -> usize {
        self.speedup_data(min_points).len()
    }
}

fn accumulate_error(err: AccumulateError, experiment: &Experiment, point: &str) -> ProfileError {
    let location = experiment.selected.clone();
    let point = point.to_string();
    match err {
        AccumulateError::KindMismatch { .. } => ProfileError::MixedPointKinds { location, point },
        AccumulateError::Overflow => ProfileError::CounterOverflow { location, point },
    }
}

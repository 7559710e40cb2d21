//! Location type used for selected code locations in profiler logs.
//!
//! Example log location: `src/main.c:42`  =>  Location("src/main.c:42")
//!
//! We keep the raw text (the profiler is free to emit anything). Ordering is
//! by file, then numeric line, so `foo.c:9` sorts before `foo.c:10`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static PATH_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*):(\d+)$").expect("static location regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(pub String);

impl Location {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(file, line)` when the id has the usual `path:line` shape.
    pub fn file_and_line(&self) -> Option<(&str, u32)> {
        let caps = PATH_LINE_RE.captures(&self.0)?;
        let file = caps.get(1)?.as_str();
        let line = caps.get(2)?.as_str().parse().ok()?;
        Some((file, line))
    }

    fn sort_key(&self) -> (&str, Option<u32>, &str) {
        match self.file_and_line() {
            Some((file, line)) => (file, Some(line), &self.0),
            None => (&self.0, None, &self.0),
        }
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

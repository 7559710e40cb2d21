#![allow(dead_code)]

use causal_profile_viz::Profile;
use std::cell::RefCell;
use std::rc::Rc;

pub const FIXTURES_DIR: &str = "tests/fixtures";

pub fn fixture(name: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{name}");
    std::fs::read_to_string(&path).expect("failed to read fixture")
}

/// Warnings captured from a sink, shareable with a boxed sink.
#[derive(Clone, Default)]
pub struct Warnings(pub Rc<RefCell<Vec<(String, String)>>>);

impl Warnings {
    pub fn sink(&self) -> impl FnMut(&str, &str) + 'static {
        let seen = Rc::clone(&self.0);
        move |title: &str, message: &str| seen.borrow_mut().push((title.to_string(), message.to_string()))
    }

    pub fn titles(&self) -> Vec<String> {
        self.0.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Build a profile from tab-separated lines, collecting warnings.
pub fn profile_from_lines(lines: &[&str]) -> (Profile, Warnings) {
    let warnings = Warnings::default();
    let mut sink = warnings.sink();
    let profile = Profile::parse(&lines.join("\n"), &mut sink).expect("failed to parse profile");
    (profile, warnings)
}

pub fn experiment(selected: &str, speedup: u32, duration: i64) -> String {
    format!("experiment\tselected={selected}\tspeedup={speedup}\tduration={duration}")
}

pub fn throughput(name: &str, delta: i64) -> String {
    format!("progress-point\tname={name}\ttype=source\tdelta={delta}")
}

pub fn latency(name: &str, arrivals: i64, departures: i64, difference: i64) -> String {
    format!(
        "latency-point\tname={name}\tarrivals={arrivals}\tdepartures={departures}\tdifference={difference}"
    )
}

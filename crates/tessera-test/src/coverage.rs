//! Line coverage collected by the interpreter

use crate::location::Location;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Default)]
struct LocationCoverage {
    /// Line -> hit count, for every statement line of the program
    lines: BTreeMap<usize, u64>,
}

/// Thread-safe statement coverage, keyed by program location
///
/// The runtime registers the statement lines of each program it loads with
/// [`CoverageReport::inspect_program`] and records executions with
/// [`CoverageReport::add_line_hit`]. Excluded locations are ignored by both.
#[derive(Debug, Default)]
pub struct CoverageReport {
    coverage: RwLock<HashMap<Location, LocationCoverage>>,
    excluded: RwLock<HashSet<Location>>,
}

impl CoverageReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop tracking `location`, dropping anything collected for it
    pub fn exclude_location(&self, location: Location) {
        self.coverage.write().remove(&location);
        self.excluded.write().insert(location);
    }

    /// Whether `location` is excluded
    pub fn is_location_excluded(&self, location: &Location) -> bool {
        self.excluded.read().contains(location)
    }

    /// Excluded locations, in display order
    pub fn excluded_locations(&self) -> Vec<Location> {
        let mut locations: Vec<_> = self.excluded.read().iter().cloned().collect();
        locations.sort_by_key(|l| l.to_string());
        locations
    }

    /// Register the statement lines of the program at `location`
    pub fn inspect_program(&self, location: &Location, lines: impl IntoIterator<Item = usize>) {
        if self.is_location_excluded(location) {
            return;
        }
        let mut coverage = self.coverage.write();
        let entry = coverage.entry(location.clone()).or_default();
        for line in lines {
            entry.lines.entry(line).or_insert(0);
        }
    }

    /// Record one execution of `line` in the program at `location`
    pub fn add_line_hit(&self, location: &Location, line: usize) {
        if self.is_location_excluded(location) {
            return;
        }
        let mut coverage = self.coverage.write();
        *coverage
            .entry(location.clone())
            .or_default()
            .lines
            .entry(line)
            .or_insert(0) += 1;
    }

    /// Hit counts per line for `location`
    pub fn line_hits(&self, location: &Location) -> Option<BTreeMap<usize, u64>> {
        self.coverage.read().get(location).map(|c| c.lines.clone())
    }

    /// Tracked locations, in display order
    pub fn locations(&self) -> Vec<Location> {
        let mut locations: Vec<_> = self.coverage.read().keys().cloned().collect();
        locations.sort_by_key(|l| l.to_string());
        locations
    }

    /// Percentage of statement lines hit at least once
    ///
    /// A report with no statements counts as fully covered.
    pub fn percentage(&self) -> f64 {
        let coverage = self.coverage.read();
        let (covered, total) = coverage
            .values()
            .flat_map(|c| c.lines.values())
            .fold((0usize, 0usize), |(covered, total), hits| {
                (covered + usize::from(*hits > 0), total + 1)
            });
        if total == 0 {
            return 100.0;
        }
        covered as f64 * 100.0 / total as f64
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coverage: {:.1}% of statements", self.percentage())
    }
}

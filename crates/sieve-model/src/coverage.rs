//! Coverage measures exposed by the broker-under-test.
//!
//! A snapshot is an ordered tuple of cumulative measures. Only a short
//! prefix (the novelty key) takes part in retention decisions; the later
//! positions are kept for reporting.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Number of leading measures compared for novelty.
pub const DEFAULT_NOVELTY_WIDTH: usize = 2;

/// An ordered tuple of cumulative coverage measures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageSnapshot {
    measures: Vec<u64>,
}

impl CoverageSnapshot {
    pub fn new(measures: Vec<u64>) -> Self {
        Self { measures }
    }

    pub fn measures(&self) -> &[u64] {
        &self.measures
    }

    /// The leading `width` measures. Shorter snapshots yield what they have.
    pub fn novelty_key(&self, width: usize) -> &[u64] {
        &self.measures[..width.min(self.measures.len())]
    }

    /// Whether this snapshot differs from `last` in its novelty key.
    /// With no previous snapshot everything is novel.
    pub fn is_novel(&self, last: Option<&CoverageSnapshot>, width: usize) -> bool {
        match last {
            None => true,
            Some(last) => self.novelty_key(width) != last.novelty_key(width),
        }
    }
}

impl From<Vec<u64>> for CoverageSnapshot {
    fn from(measures: Vec<u64>) -> Self {
        Self::new(measures)
    }
}

/// Source of cumulative coverage measures.
///
/// Measures must be monotonic across the session; reinitializing the
/// broker never resets them.
pub trait CoverageTracker {
    fn measures(&self) -> Vec<u64>;

    fn snapshot(&self) -> CoverageSnapshot {
        CoverageSnapshot::new(self.measures())
    }
}

impl<T: CoverageTracker + ?Sized> CoverageTracker for Arc<T> {
    fn measures(&self) -> Vec<u64> {
        (**self).measures()
    }
}

impl<T: CoverageTracker + ?Sized> CoverageTracker for &T {
    fn measures(&self) -> Vec<u64> {
        (**self).measures()
    }
}

#[derive(Debug, Default)]
struct CounterState {
    kinds: HashSet<String>,
    edges: HashSet<(String, String)>,
    previous: Option<String>,
    hits: u64,
}

/// Thread-safe cumulative counters a broker can embed and share with the driver.
///
/// Measures are `[distinct kinds, distinct kind-to-kind edges, total hits]`.
/// Total hits grows on every record and is too noisy for novelty, so it
/// sits outside the default key.
#[derive(Debug, Default)]
pub struct CoverageCounters {
    state: Mutex<CounterState>,
}

impl CoverageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed behavior, e.g. a packet type or handler branch.
    pub fn record(&self, kind: &str) {
        let mut state = self.state.lock().unwrap();
        state.hits += 1;
        state.kinds.insert(kind.to_string());
        if let Some(previous) = state.previous.take() {
            state.edges.insert((previous, kind.to_string()));
        }
        state.previous = Some(kind.to_string());
    }

    /// Forget the last recorded kind so the next record starts a fresh edge chain.
    /// Counters are untouched.
    pub fn break_chain(&self) {
        self.state.lock().unwrap().previous = None;
    }

    pub fn distinct_kinds(&self) -> usize {
        self.state.lock().unwrap().kinds.len()
    }

    pub fn distinct_edges(&self) -> usize {
        self.state.lock().unwrap().edges.len()
    }
}

impl CoverageTracker for CoverageCounters {
    fn measures(&self) -> Vec<u64> {
        let state = self.state.lock().unwrap();
        vec![
            state.kinds.len() as u64,
            state.edges.len() as u64,
            state.hits,
        ]
    }
}

//! Session results.
//!
//! One entry per attempt plus session totals, serializable so a run can be
//! archived next to its corpus.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::limits::StopReason;

/// What happened to an attempt's transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Coverage moved; the transcript was stored.
    Retained { path: PathBuf },
    /// Coverage did not move; the transcript was deleted.
    Discarded,
}

/// Per-attempt statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt index.
    pub attempt: u64,
    /// Model steps taken before the restart point.
    pub steps: u32,
    /// Distinct conformance statements hit.
    pub statements: Vec<String>,
    /// Cumulative coverage measures after the attempt.
    pub measures: Vec<u64>,
    /// Transcript lines written.
    pub transcript_lines: usize,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub fn is_retained(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Retained { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    /// Attempts executed.
    pub attempts: u64,
    /// Test cases stored.
    pub stored_tests: u64,
    pub stop_reason: StopReason,
    pub attempt_log: Vec<AttemptRecord>,
    /// Coverage measures at the end of the session.
    pub final_measures: Vec<u64>,
    /// Wall-clock elapsed seconds.
    pub elapsed_secs: f64,
}

impl GenerationReport {
    pub fn retained(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.attempt_log.iter().filter(|a| a.is_retained())
    }

    pub fn discarded_count(&self) -> usize {
        self.attempt_log.iter().filter(|a| !a.is_retained()).count()
    }

    /// Union of the statements exercised by stored tests.
    pub fn covered_statements(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .retained()
            .flat_map(|a| a.statements.iter().cloned())
            .collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

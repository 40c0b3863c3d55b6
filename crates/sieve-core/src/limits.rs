//! Session bounds.
//!
//! The search is open-ended, so a session stops at whichever comes first:
//! enough stored tests, the attempt ceiling, or an optional wall-clock cap.
//! Hitting any of them ends the session normally with partial results.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Bounds for a generation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Stop once this many test cases are stored.
    pub target_tests: u64,
    /// Never run more than this many attempts.
    pub max_attempts: u64,
    /// Maximum wall-clock seconds. None = unbounded.
    pub max_wall_secs: Option<u64>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            target_tests: 10,
            max_attempts: 30,
            max_wall_secs: None,
        }
    }
}

/// Reason a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Stored-test target reached.
    TargetReached,
    /// Attempt ceiling reached first.
    AttemptCeiling,
    /// Wall-clock cap exceeded.
    WallTimeExceeded,
}

/// Checks progress against the session limits.
pub struct LimitChecker {
    limits: SessionLimits,
    start_time: Instant,
}

impl LimitChecker {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
        }
    }

    /// Returns None to keep going, or the reason to stop.
    /// The stored-test target wins when both counters hit their bound together.
    pub fn check(&self, stored_tests: u64, attempts: u64) -> Option<StopReason> {
        if stored_tests >= self.limits.target_tests {
            return Some(StopReason::TargetReached);
        }
        if attempts >= self.limits.max_attempts {
            return Some(StopReason::AttemptCeiling);
        }
        if let Some(max) = self.limits.max_wall_secs {
            if self.start_time.elapsed().as_secs() >= max {
                return Some(StopReason::WallTimeExceeded);
            }
        }
        None
    }

    /// Elapsed seconds since start.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }
}

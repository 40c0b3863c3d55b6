/// Signals carried on the event queue alongside every record.
/// The generation loop steers purely off these tags.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Level, Source};

/// A normative-requirement identifier, e.g. `[MQTT-3.1.2-1]`.
///
/// Identity is the exact text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConformanceStatement(String);

impl ConformanceStatement {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConformanceStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConformanceStatement {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a queued record means to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Plain log text, kept for the transcript only.
    Record,
    /// A conformance statement was checked.
    ConformanceHit(ConformanceStatement),
    /// The model is idle awaiting further work.
    StepSettled,
    /// The broker finished an interaction.
    Terminated,
}

impl SignalKind {
    /// Whether this signal ends a step drain.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::StepSettled | Self::Terminated)
    }
}

/// The marker that ended a step drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminator {
    StepSettled,
    Terminated,
}

/// An event as sent by a producer, before the collector stamps its position.
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub level: Level,
    pub source: Source,
    pub message: String,
    pub kind: SignalKind,
}

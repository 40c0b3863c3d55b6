use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a captured log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::INFO => Self::Info,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::TRACE => Self::Trace,
        }
    }
}

/// Which side of the interaction emitted a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// The broker-under-test's internal logger.
    Broker,
    /// The model driver (model stepper and its clients).
    Driver,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broker => "broker",
            Self::Driver => "driver",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record as observed by the collector.
///
/// `position` is stamped at arrival, so positions form the one total order
/// across broker and driver records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Arrival order position within the session (monotonic, starts at 0).
    pub position: u64,
    pub level: Level,
    pub source: Source,
    /// Message text, verbatim.
    pub message: String,
}

impl LogRecord {
    /// One-line transcript rendering: `{position:06} {LEVEL} {source} {message}`.
    ///
    /// Embedded newlines are escaped so that one record is always one line.
    pub fn render(&self) -> String {
        let message = self.message.trim_end_matches('\n').replace('\n', "\\n");
        format!(
            "{:06} {} {} {}",
            self.position, self.level, self.source, message
        )
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

//! Text markers for records that only arrive as log text.
//!
//! Typed producers bypass this entirely; the tracing layer and
//! [`EventSender::emit`](crate::queue::EventSender::emit) classify
//! through a [`MarkerSet`].

use serde::{Deserialize, Serialize};

use crate::signal::{ConformanceStatement, SignalKind};

/// Recognized marker phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSet {
    /// Prefix that opens a conformance-statement identifier.
    pub conformance_prefix: String,
    /// Phrases meaning the model is idle awaiting further work.
    pub settled_phrases: Vec<String>,
    /// Phrases meaning the broker has finished an interaction.
    pub terminated_phrases: Vec<String>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            conformance_prefix: "[MQTT".to_string(),
            settled_phrases: vec!["Waiting for request".to_string()],
            terminated_phrases: vec!["Finishing communications".to_string()],
        }
    }
}

impl MarkerSet {
    /// Classify a line of log text.
    ///
    /// Termination phrases win over a conformance prefix on the same line.
    pub fn classify(&self, text: &str) -> SignalKind {
        if self.settled_phrases.iter().any(|p| text.contains(p.as_str())) {
            return SignalKind::StepSettled;
        }
        if self
            .terminated_phrases
            .iter()
            .any(|p| text.contains(p.as_str()))
        {
            return SignalKind::Terminated;
        }
        match self.extract_statement(text) {
            Some(statement) => SignalKind::ConformanceHit(statement),
            None => SignalKind::Record,
        }
    }

    /// Extract the identifier that starts at the conformance prefix.
    ///
    /// Runs to the closing `]`; an unclosed identifier takes the rest of the line.
    pub fn extract_statement(&self, text: &str) -> Option<ConformanceStatement> {
        if self.conformance_prefix.is_empty() {
            return None;
        }
        let start = text.find(self.conformance_prefix.as_str())?;
        let tail = &text[start..];
        let id = match tail.find(']') {
            Some(end) => &tail[..=end],
            None => tail.lines().next().unwrap_or(tail).trim_end(),
        };
        Some(ConformanceStatement::new(id))
    }
}

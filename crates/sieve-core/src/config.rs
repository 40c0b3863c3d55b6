use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sieve_broker::BrokerConfig;
use sieve_model::DEFAULT_NOVELTY_WIDTH;
use sieve_signal::{Collector, EventQueue, EventSender, MarkerSet};

use crate::error::GenerationError;
use crate::limits::SessionLimits;
use crate::telemetry::TelemetryConfig;

/// Configuration for a generation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory receiving `test.log.{attempt}` files. Wiped at session start.
    pub output_dir: PathBuf,
    pub limits: SessionLimits,
    /// Leading coverage measures compared for novelty.
    pub novelty_width: usize,
    /// Bound on each wait for the next log record, in milliseconds.
    /// None waits forever.
    pub step_timeout_ms: Option<u64>,
    pub broker: BrokerConfig,
    pub markers: MarkerSet,
    pub telemetry: TelemetryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("tests"),
            limits: SessionLimits::default(),
            novelty_width: DEFAULT_NOVELTY_WIDTH,
            step_timeout_ms: Some(30_000),
            broker: BrokerConfig::default(),
            markers: MarkerSet::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, GenerationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.novelty_width == 0 {
            return Err(GenerationError::InvalidConfig(
                "novelty_width must be at least 1".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(GenerationError::InvalidConfig(
                "output_dir must not be empty".to_string(),
            ));
        }
        if self.markers.conformance_prefix.is_empty() {
            return Err(GenerationError::InvalidConfig(
                "conformance_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }

    /// Build the shared event queue with this config's markers and step timeout.
    pub fn event_queue(&self) -> (EventSender, Collector) {
        EventQueue::with_timeout(self.markers.clone(), self.step_timeout())
    }
}

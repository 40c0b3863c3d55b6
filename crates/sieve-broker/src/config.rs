/// Broker lifecycle configuration: handshake bounds and settle delay.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing for starting and stopping the broker-under-test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Pause after readiness and after shutdown, in milliseconds (default: 1 s).
    pub settle_delay_ms: u64,
    /// Maximum wait for the broker to signal readiness (default: 30 s).
    pub ready_timeout_ms: u64,
    /// Maximum wait for the broker thread to finish after a stop request (default: 30 s).
    pub stop_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1_000,
            ready_timeout_ms: 30_000,
            stop_timeout_ms: 30_000,
        }
    }
}

impl BrokerConfig {
    /// No settle delay and short handshakes, for in-process brokers.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            ready_timeout_ms: 5_000,
            stop_timeout_ms: 5_000,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

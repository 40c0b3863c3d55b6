//! Process-wide `tracing` setup.
//!
//! Events under the broker and model targets go to the event queue; all
//! other events go to a console formatter on stderr, filtered by `RUST_LOG`
//! or the configured directive.

use serde::{Deserialize, Serialize};
use sieve_signal::{EventSender, QueueLayer};
use tracing::Metadata;
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Target prefix of the broker's log events.
    pub broker_target: String,
    /// Target prefix of the model driver's log events.
    pub model_target: String,
    /// Lowest level captured into the event queue.
    pub capture_level: String,
    /// Console directive used when `RUST_LOG` is unset.
    pub console_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            broker_target: "broker".to_string(),
            model_target: "model".to_string(),
            capture_level: "info".to_string(),
            console_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("unknown capture level: {0}")]
    Level(String),

    #[error("global subscriber already installed: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(sender: EventSender, config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let capture_level: LevelFilter = config
        .capture_level
        .parse()
        .map_err(|_| TelemetryError::Level(config.capture_level.clone()))?;

    let queue = QueueLayer::new(
        sender,
        config.broker_target.clone(),
        config.model_target.clone(),
    );
    let captured = queue.clone();
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.console_filter));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(move |meta: &Metadata<'_>| !captured.captures(meta)))
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(queue.with_filter(capture_level))
        .with(console)
        .try_init()?;
    Ok(())
}

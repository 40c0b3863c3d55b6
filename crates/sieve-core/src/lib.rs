pub mod config;
pub mod error;
pub mod limits;
pub mod report;
pub mod session;
pub mod telemetry;

pub use config::GenerationConfig;
pub use error::GenerationError;
pub use limits::{LimitChecker, SessionLimits, StopReason};
pub use report::{AttemptOutcome, AttemptRecord, GenerationReport};
pub use session::GenerationSession;
pub use telemetry::{TelemetryConfig, TelemetryError};

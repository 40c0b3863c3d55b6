pub mod coverage;
pub mod stepper;

pub use coverage::{CoverageCounters, CoverageSnapshot, CoverageTracker, DEFAULT_NOVELTY_WIDTH};
pub use stepper::{ModelError, ModelStepper, Step};

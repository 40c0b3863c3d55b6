pub mod collector;
pub mod layer;
pub mod markers;
pub mod queue;
pub mod record;
pub mod signal;

pub use collector::{CollectError, Collector, PendingRecords, StepCapture};
pub use layer::QueueLayer;
pub use markers::MarkerSet;
pub use queue::{EventQueue, EventSender};
pub use record::{Level, LogRecord, Source};
pub use signal::{ConformanceStatement, SignalKind, Terminator};

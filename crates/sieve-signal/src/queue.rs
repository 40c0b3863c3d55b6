//! The shared event queue.
//!
//! One unbounded crossbeam channel carries every record from the broker and
//! the driver. Senders are cheap to clone; there is exactly one consumer,
//! the [`Collector`], which stamps arrival positions.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use crate::collector::Collector;
use crate::markers::MarkerSet;
use crate::record::{Level, Source};
use crate::signal::{ConformanceStatement, QueuedEvent, SignalKind};

/// Factory for a connected sender/collector pair.
pub struct EventQueue;

impl EventQueue {
    /// Create a queue classifying text with the given markers.
    /// The collector waits without bound until a timeout is set.
    pub fn new(markers: MarkerSet) -> (EventSender, Collector) {
        Self::with_timeout(markers, None)
    }

    /// Create a queue whose collector bounds each wait by `timeout`.
    pub fn with_timeout(markers: MarkerSet, timeout: Option<Duration>) -> (EventSender, Collector) {
        let (tx, rx): (Sender<QueuedEvent>, Receiver<QueuedEvent>) = channel::unbounded();
        let sender = EventSender {
            tx,
            markers: Arc::new(markers),
        };
        (sender, Collector::new(rx, timeout))
    }
}

/// Producer handle, shared by the broker thread and the model driver.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<QueuedEvent>,
    markers: Arc<MarkerSet>,
}

impl EventSender {
    /// Send plain log text, classified by the marker set.
    /// Returns false if the collector is gone.
    pub fn emit(&self, level: Level, source: Source, message: impl Into<String>) -> bool {
        let message = message.into();
        let kind = self.markers.classify(&message);
        self.send(QueuedEvent {
            level,
            source,
            message,
            kind,
        })
    }

    /// Send a record with an explicit signal tag; no text matching.
    pub fn signal(
        &self,
        level: Level,
        source: Source,
        message: impl Into<String>,
        kind: SignalKind,
    ) -> bool {
        self.send(QueuedEvent {
            level,
            source,
            message: message.into(),
            kind,
        })
    }

    /// Report a conformance statement hit. The record text is the identifier.
    pub fn conformance(&self, source: Source, statement: ConformanceStatement) -> bool {
        let message = statement.to_string();
        self.signal(
            Level::Info,
            source,
            message,
            SignalKind::ConformanceHit(statement),
        )
    }

    /// Report that the model is idle awaiting further work.
    pub fn settled(&self, source: Source, message: impl Into<String>) -> bool {
        self.signal(Level::Info, source, message, SignalKind::StepSettled)
    }

    /// Report that the broker finished an interaction.
    pub fn terminated(&self, source: Source, message: impl Into<String>) -> bool {
        self.signal(Level::Info, source, message, SignalKind::Terminated)
    }

    /// The marker set used by [`emit`](Self::emit).
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    fn send(&self, event: QueuedEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

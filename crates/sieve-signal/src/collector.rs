//! Drains one step's worth of records from the shared queue.

use std::collections::BTreeSet;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::record::LogRecord;
use crate::signal::{ConformanceStatement, QueuedEvent, SignalKind, Terminator};

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("no record arrived within {waited:?} ({records} records seen this step)")]
    Timeout { waited: Duration, records: usize },

    #[error("event queue disconnected ({records} records seen this step)")]
    Disconnected { records: usize },
}

/// Everything observed during one model step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCapture {
    /// Distinct conformance statements hit during the step.
    pub statements: BTreeSet<ConformanceStatement>,
    /// Every record of the step in arrival order, markers included.
    pub records: Vec<LogRecord>,
    /// The marker that ended the drain.
    pub terminator: Terminator,
}

/// Records already queued, taken without waiting for a marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingRecords {
    pub statements: BTreeSet<ConformanceStatement>,
    pub records: Vec<LogRecord>,
}

/// The single consumer of the event queue.
#[derive(Debug)]
pub struct Collector {
    rx: Receiver<QueuedEvent>,
    next_position: u64,
    timeout: Option<Duration>,
}

impl Collector {
    pub(crate) fn new(rx: Receiver<QueuedEvent>, timeout: Option<Duration>) -> Self {
        Self {
            rx,
            next_position: 0,
            timeout,
        }
    }

    /// Bound each wait for the next record. `None` waits forever.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Total records consumed so far, discarded ones included.
    pub fn records_seen(&self) -> u64 {
        self.next_position
    }

    /// Pop records until a step-termination marker.
    ///
    /// Conformance hits accumulate into the step's statement set and the
    /// drain continues. The terminating record itself is kept in `records`.
    pub fn collect_step(&mut self) -> Result<StepCapture, CollectError> {
        let mut statements = BTreeSet::new();
        let mut records = Vec::new();

        loop {
            let event = match self.next_event() {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CollectError::Timeout {
                        waited: self.timeout.unwrap_or_default(),
                        records: records.len(),
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CollectError::Disconnected {
                        records: records.len(),
                    })
                }
            };

            let (record, kind) = self.stamp(event);
            tracing::trace!(position = record.position, "data {}", record.message);
            records.push(record);

            match kind {
                SignalKind::Record => {}
                SignalKind::ConformanceHit(statement) => {
                    tracing::debug!("Conformance statement {}", statement);
                    statements.insert(statement);
                }
                SignalKind::StepSettled => {
                    return Ok(StepCapture {
                        statements,
                        records,
                        terminator: Terminator::StepSettled,
                    })
                }
                SignalKind::Terminated => {
                    return Ok(StepCapture {
                        statements,
                        records,
                        terminator: Terminator::Terminated,
                    })
                }
            }
        }
    }

    /// Take whatever is queued right now without waiting.
    ///
    /// Markers are not interpreted; conformance hits still count.
    pub fn take_pending(&mut self) -> PendingRecords {
        let mut pending = PendingRecords::default();
        while let Ok(event) = self.rx.try_recv() {
            let (record, kind) = self.stamp(event);
            if let SignalKind::ConformanceHit(statement) = kind {
                pending.statements.insert(statement);
            }
            pending.records.push(record);
        }
        pending
    }

    /// Discard whatever is queued right now without waiting.
    /// Returns how many records were dropped.
    pub fn drain_pending(&mut self) -> usize {
        self.take_pending().records.len()
    }

    fn next_event(&self) -> Result<QueuedEvent, RecvTimeoutError> {
        match self.timeout {
            Some(timeout) => self.rx.recv_timeout(timeout),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        }
    }

    fn stamp(&mut self, event: QueuedEvent) -> (LogRecord, SignalKind) {
        let record = LogRecord {
            position: self.next_position,
            level: event.level,
            source: event.source,
            message: event.message,
        };
        self.next_position += 1;
        (record, event.kind)
    }
}

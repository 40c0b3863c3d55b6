use std::fmt;

use crossbeam::channel::Sender;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open listening endpoint: {0}")]
    Bind(String),

    #[error("reinitialize failed: {0}")]
    Reinitialize(String),

    #[error("broker failure: {0}")]
    Other(String),
}

/// Where the broker is reachable, handed over at readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint(pub String);

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-shot readiness handshake, fulfilled by the broker thread.
///
/// Dropping it unfired tells the controller the broker will never be ready.
#[derive(Debug)]
pub struct ReadySignal {
    tx: Sender<BrokerEndpoint>,
}

impl ReadySignal {
    pub(crate) fn new(tx: Sender<BrokerEndpoint>) -> Self {
        Self { tx }
    }

    /// Announce that the listening endpoint is up.
    pub fn fire(self, endpoint: BrokerEndpoint) {
        // The controller may have given up waiting; nothing to do then.
        let _ = self.tx.send(endpoint);
    }
}

/// Trait abstracting the broker-under-test.
///
/// `run` is called once, on a dedicated thread, and serves until `stop`
/// is requested from another thread. `reinitialize` clears sessions,
/// topics and retained messages but keeps the endpoint and the cumulative
/// coverage counters.
pub trait BrokerUnderTest: Send + Sync + 'static {
    fn run(&self, ready: ReadySignal) -> Result<(), BrokerError>;

    fn stop(&self);

    fn reinitialize(&self) -> Result<(), BrokerError>;
}

//! Starts, stops and reinitializes the broker-under-test on its own thread.
//!
//! Readiness and shutdown are one-shot handshakes over bounded channels,
//! each wait bounded by the configured timeout. A controller owns at most
//! one broker thread for its whole life.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::broker::{BrokerEndpoint, BrokerError, BrokerUnderTest, ReadySignal};
use crate::config::BrokerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("broker already started for this session")]
    AlreadyStarted,

    #[error("broker was never started")]
    NotStarted,

    #[error("broker is not running")]
    NotRunning,

    #[error("broker did not signal readiness within {0} ms")]
    ReadyTimeout(u64),

    #[error("broker thread did not finish within {0} ms of the stop request")]
    StopTimeout(u64),

    #[error("broker exited before signalling readiness")]
    ExitedBeforeReady,

    #[error("broker thread panicked")]
    Panicked,

    #[error("failed to spawn broker thread: {0}")]
    Spawn(std::io::Error),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Sends the stopped handshake when the broker thread unwinds or returns.
struct StoppedGuard(Sender<()>);

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// A spawned broker thread and its stopped handshake.
struct BrokerThread {
    handle: JoinHandle<Result<(), BrokerError>>,
    stopped: Receiver<()>,
}

struct RunningBroker {
    thread: BrokerThread,
    endpoint: BrokerEndpoint,
}

enum ControllerState {
    Idle,
    Running(RunningBroker),
    /// Stop was requested but the thread has not finished yet.
    Stopping(BrokerThread),
    Stopped,
}

/// Lifecycle controller for one broker-under-test.
pub struct BrokerController<B: BrokerUnderTest + ?Sized> {
    broker: Arc<B>,
    config: BrokerConfig,
    state: ControllerState,
}

impl<B: BrokerUnderTest + ?Sized> BrokerController<B> {
    pub fn new(broker: Arc<B>, config: BrokerConfig) -> Self {
        Self {
            broker,
            config,
            state: ControllerState::Idle,
        }
    }

    /// Launch the broker thread and wait for readiness, then settle.
    pub fn start(&mut self) -> Result<BrokerEndpoint, ControllerError> {
        if !matches!(self.state, ControllerState::Idle) {
            return Err(ControllerError::AlreadyStarted);
        }
        // Any failure from here on consumes the single start.
        self.state = ControllerState::Stopped;

        let (ready_tx, ready_rx) = channel::bounded(1);
        let (stopped_tx, stopped_rx) = channel::bounded(1);
        let broker = Arc::clone(&self.broker);

        let handle = thread::Builder::new()
            .name("broker".to_string())
            .spawn(move || {
                let _guard = StoppedGuard(stopped_tx);
                broker.run(ReadySignal::new(ready_tx))
            })
            .map_err(ControllerError::Spawn)?;
        let worker = BrokerThread {
            handle,
            stopped: stopped_rx,
        };

        let endpoint = match ready_rx.recv_timeout(self.config.ready_timeout()) {
            Ok(endpoint) => endpoint,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("Broker not ready after {} ms", self.config.ready_timeout_ms);
                self.broker.stop();
                if let Err(e) = self.join_stopped(worker) {
                    tracing::warn!("Broker did not shut down after readiness timeout: {}", e);
                }
                return Err(ControllerError::ReadyTimeout(self.config.ready_timeout_ms));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(match worker.handle.join() {
                    Ok(Ok(())) => ControllerError::ExitedBeforeReady,
                    Ok(Err(e)) => ControllerError::Broker(e),
                    Err(_) => ControllerError::Panicked,
                });
            }
        };

        tracing::info!("Broker ready on {}", endpoint);
        thread::sleep(self.config.settle_delay());

        self.state = ControllerState::Running(RunningBroker {
            thread: worker,
            endpoint: endpoint.clone(),
        });
        Ok(endpoint)
    }

    /// Request shutdown and wait for the broker thread to finish, then settle.
    ///
    /// Calling it again after a successful stop is a no-op. After a
    /// `StopTimeout` the thread stays owned by the controller, and the next
    /// call repeats the request and the bounded wait.
    pub fn stop(&mut self) -> Result<(), ControllerError> {
        let worker = match std::mem::replace(&mut self.state, ControllerState::Stopped) {
            ControllerState::Idle => {
                self.state = ControllerState::Idle;
                return Err(ControllerError::NotStarted);
            }
            ControllerState::Stopped => return Ok(()),
            ControllerState::Running(running) => running.thread,
            ControllerState::Stopping(worker) => worker,
        };

        self.broker.stop();
        self.join_stopped(worker)
    }

    /// Wait for the stopped handshake, bounded, then join the thread.
    /// On timeout the thread is parked in `Stopping`.
    fn join_stopped(&mut self, worker: BrokerThread) -> Result<(), ControllerError> {
        match worker.stopped.recv_timeout(self.config.stop_timeout()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Broker thread still running {} ms after stop request",
                    self.config.stop_timeout_ms
                );
                self.state = ControllerState::Stopping(worker);
                return Err(ControllerError::StopTimeout(self.config.stop_timeout_ms));
            }
        }

        let outcome = worker.handle.join();
        self.state = ControllerState::Stopped;
        thread::sleep(self.config.settle_delay());
        tracing::info!("Broker stopped");

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ControllerError::Broker(e)),
            Err(_) => Err(ControllerError::Panicked),
        }
    }

    /// Clear broker session state between attempts.
    pub fn reinitialize(&self) -> Result<(), ControllerError> {
        match self.state {
            ControllerState::Running(_) => {
                tracing::debug!("Reinitializing broker");
                self.broker.reinitialize().map_err(ControllerError::from)
            }
            _ => Err(ControllerError::NotRunning),
        }
    }

    /// True while a broker thread is alive under this controller,
    /// including one whose stop request has not completed.
    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            ControllerState::Running(_) | ControllerState::Stopping(_)
        )
    }

    /// The endpoint handed over at readiness, while serving.
    pub fn endpoint(&self) -> Option<&BrokerEndpoint> {
        match &self.state {
            ControllerState::Running(running) => Some(&running.endpoint),
            _ => None,
        }
    }

    pub fn broker(&self) -> &Arc<B> {
        &self.broker
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

impl<B: BrokerUnderTest + ?Sized> Drop for BrokerController<B> {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::warn!("Force-stopping broker at teardown");
            if let Err(e) = self.stop() {
                tracing::warn!("Broker teardown failed: {}", e);
            }
        }
    }
}

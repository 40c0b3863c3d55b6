use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sieve_broker::{
    BrokerConfig, BrokerController, BrokerEndpoint, BrokerError, BrokerUnderTest,
    ControllerError, ReadySignal,
};

/// Fails to bind its listening endpoint.
struct UnbindableBroker;

impl BrokerUnderTest for UnbindableBroker {
    fn run(&self, _ready: ReadySignal) -> Result<(), BrokerError> {
        Err(BrokerError::Bind("address in use".to_string()))
    }

    fn stop(&self) {}

    fn reinitialize(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

/// Returns without ever announcing readiness.
struct SilentBroker;

impl BrokerUnderTest for SilentBroker {
    fn run(&self, _ready: ReadySignal) -> Result<(), BrokerError> {
        Ok(())
    }

    fn stop(&self) {}

    fn reinitialize(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

/// Never gets ready; takes a while to wind down once stopped.
struct StuckBroker {
    stopped: AtomicBool,
    finished: AtomicBool,
}

impl BrokerUnderTest for StuckBroker {
    fn run(&self, _ready: ReadySignal) -> Result<(), BrokerError> {
        while !self.stopped.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(30));
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn reinitialize(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

/// Keeps serving for `linger` after the stop request.
struct LingeringBroker {
    stop_requested: AtomicBool,
    finished: AtomicBool,
    linger: Duration,
}

impl BrokerUnderTest for LingeringBroker {
    fn run(&self, ready: ReadySignal) -> Result<(), BrokerError> {
        ready.fire(BrokerEndpoint("localhost:1883".to_string()));
        while !self.stop_requested.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(2));
        }
        thread::sleep(self.linger);
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    fn reinitialize(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

/// Polls a stop flag, like a listener loop with a short accept timeout.
struct PollingBroker {
    stopped: AtomicBool,
    reinit_fails: bool,
}

impl BrokerUnderTest for PollingBroker {
    fn run(&self, ready: ReadySignal) -> Result<(), BrokerError> {
        ready.fire(BrokerEndpoint("localhost:1883".to_string()));
        while !self.stopped.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn reinitialize(&self) -> Result<(), BrokerError> {
        if self.reinit_fails {
            Err(BrokerError::Reinitialize("retained store locked".to_string()))
        } else {
            Ok(())
        }
    }
}

#[test]
fn test_bind_failure_surfaces_broker_error() {
    let mut controller = BrokerController::new(Arc::new(UnbindableBroker), BrokerConfig::immediate());
    match controller.start() {
        Err(ControllerError::Broker(BrokerError::Bind(msg))) => assert!(msg.contains("in use")),
        other => panic!("expected bind failure, got {:?}", other),
    }
    assert!(!controller.is_running());
}

#[test]
fn test_exit_without_readiness() {
    let mut controller = BrokerController::new(Arc::new(SilentBroker), BrokerConfig::immediate());
    assert!(matches!(
        controller.start(),
        Err(ControllerError::ExitedBeforeReady)
    ));
}

#[test]
fn test_readiness_wait_is_bounded() {
    let config = BrokerConfig {
        settle_delay_ms: 0,
        ready_timeout_ms: 50,
        stop_timeout_ms: 1_000,
    };
    let broker = Arc::new(StuckBroker {
        stopped: AtomicBool::new(false),
        finished: AtomicBool::new(false),
    });
    let mut controller = BrokerController::new(Arc::clone(&broker), config);

    let started = Instant::now();
    assert!(matches!(
        controller.start(),
        Err(ControllerError::ReadyTimeout(50))
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
    // The controller asked the stuck broker to give up and joined its thread.
    assert!(broker.stopped.load(Ordering::SeqCst));
    assert!(broker.finished.load(Ordering::SeqCst));
    assert!(!controller.is_running());
}

#[test]
fn test_stop_timeout_keeps_thread_owned() {
    let config = BrokerConfig {
        settle_delay_ms: 0,
        ready_timeout_ms: 1_000,
        stop_timeout_ms: 20,
    };
    let broker = Arc::new(LingeringBroker {
        stop_requested: AtomicBool::new(false),
        finished: AtomicBool::new(false),
        linger: Duration::from_millis(150),
    });
    let mut controller = BrokerController::new(Arc::clone(&broker), config);
    controller.start().unwrap();

    assert!(matches!(controller.stop(), Err(ControllerError::StopTimeout(20))));
    assert!(controller.is_running());
    assert!(controller.endpoint().is_none());
    assert!(matches!(
        controller.reinitialize(),
        Err(ControllerError::NotRunning)
    ));
    assert!(!broker.finished.load(Ordering::SeqCst));

    thread::sleep(Duration::from_millis(300));
    controller.stop().unwrap();
    assert!(broker.finished.load(Ordering::SeqCst));
    assert!(!controller.is_running());
    controller.stop().unwrap();
}

#[test]
fn test_drop_retries_timed_out_stop() {
    let config = BrokerConfig {
        settle_delay_ms: 0,
        ready_timeout_ms: 1_000,
        stop_timeout_ms: 20,
    };
    let broker = Arc::new(LingeringBroker {
        stop_requested: AtomicBool::new(false),
        finished: AtomicBool::new(false),
        linger: Duration::from_millis(60),
    });
    {
        let mut controller = BrokerController::new(Arc::clone(&broker), config);
        controller.start().unwrap();
        assert!(controller.stop().is_err());
        thread::sleep(Duration::from_millis(150));
    }
    // Dropping the controller joined the thread, releasing its Arc.
    assert!(broker.finished.load(Ordering::SeqCst));
    assert_eq!(Arc::strong_count(&broker), 1);
}

#[test]
fn test_settle_delay_applies_to_start_and_stop() {
    let config = BrokerConfig {
        settle_delay_ms: 40,
        ..BrokerConfig::immediate()
    };
    let broker = Arc::new(PollingBroker {
        stopped: AtomicBool::new(false),
        reinit_fails: false,
    });
    let mut controller = BrokerController::new(broker, config);

    let started = Instant::now();
    controller.start().unwrap();
    assert!(started.elapsed() >= Duration::from_millis(40));

    let stopping = Instant::now();
    controller.stop().unwrap();
    assert!(stopping.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_reinitialize_failure_is_reported() {
    let broker = Arc::new(PollingBroker {
        stopped: AtomicBool::new(false),
        reinit_fails: true,
    });
    let mut controller = BrokerController::new(broker, BrokerConfig::immediate());
    controller.start().unwrap();
    assert!(matches!(
        controller.reinitialize(),
        Err(ControllerError::Broker(BrokerError::Reinitialize(_)))
    ));
    // Still running; a failed reset does not tear the broker down.
    assert!(controller.is_running());
    controller.stop().unwrap();
}

#[test]
fn test_trait_object_broker() {
    let broker: Arc<dyn BrokerUnderTest> = Arc::new(PollingBroker {
        stopped: AtomicBool::new(false),
        reinit_fails: false,
    });
    let mut controller = BrokerController::new(broker, BrokerConfig::immediate());
    let endpoint = controller.start().unwrap();
    assert_eq!(endpoint.0, "localhost:1883");
    assert_eq!(controller.endpoint(), Some(&endpoint));
    controller.stop().unwrap();
}

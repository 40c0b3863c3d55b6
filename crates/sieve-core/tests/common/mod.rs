#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::{unbounded, Receiver, Sender};
use sieve_broker::{BrokerConfig, BrokerEndpoint, BrokerError, BrokerUnderTest, ReadySignal};
use sieve_core::{GenerationConfig, GenerationSession};
use sieve_model::{CoverageTracker, ModelError, ModelStepper, Step};
use sieve_signal::{ConformanceStatement, EventSender, Level, Source};

pub enum Command {
    /// Handle a request: report the statements, then finish the interaction.
    Serve(Vec<String>),
    /// Log the request but never finish it.
    Hang,
    Stop,
}

/// In-process broker answering on its own thread.
pub struct StubBroker {
    sender: EventSender,
    tx: Sender<Command>,
    rx: Receiver<Command>,
    pub reinits: AtomicU64,
    pub stopped: AtomicBool,
}

impl StubBroker {
    pub fn new(sender: EventSender) -> Self {
        let (tx, rx) = unbounded();
        Self {
            sender,
            tx,
            rx,
            reinits: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn request(&self, command: Command) {
        let _ = self.tx.send(command);
    }
}

impl BrokerUnderTest for StubBroker {
    fn run(&self, ready: ReadySignal) -> Result<(), BrokerError> {
        self.sender.emit(Level::Info, Source::Broker, "Broker listening");
        ready.fire(BrokerEndpoint("stub:1883".to_string()));
        while let Ok(command) = self.rx.recv() {
            match command {
                Command::Serve(statements) => {
                    for id in statements {
                        self.sender
                            .conformance(Source::Broker, ConformanceStatement::new(id));
                    }
                    self.sender
                        .emit(Level::Info, Source::Broker, "Finishing communications");
                }
                Command::Hang => {
                    self.sender.emit(Level::Warn, Source::Broker, "Malformed packet");
                }
                Command::Stop => break,
            }
        }
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.tx.send(Command::Stop);
    }

    fn reinitialize(&self) -> Result<(), BrokerError> {
        self.reinits.fetch_add(1, Ordering::SeqCst);
        self.sender
            .emit(Level::Debug, Source::Broker, "Session state cleared");
        Ok(())
    }
}

/// Coverage measures set directly by the scripted model.
#[derive(Default)]
pub struct ScriptedCoverage {
    measures: Mutex<Vec<u64>>,
}

impl ScriptedCoverage {
    pub fn set(&self, measures: Vec<u64>) {
        *self.measures.lock().unwrap() = measures;
    }
}

impl CoverageTracker for ScriptedCoverage {
    fn measures(&self) -> Vec<u64> {
        self.measures.lock().unwrap().clone()
    }
}

#[derive(Clone)]
pub enum StepScript {
    Serve(Vec<&'static str>),
    /// The driver ends the step itself, then logs `trailer` behind the marker.
    CloseWithTrailer(&'static str),
    Hang,
    Fail,
}

/// One attempt: its steps and the measures it leaves behind.
#[derive(Clone)]
pub struct AttemptScript {
    pub steps: Vec<StepScript>,
    pub measures: Vec<u64>,
}

impl AttemptScript {
    pub fn new(statements: &[&'static str], measures: &[u64]) -> Self {
        Self {
            steps: vec![StepScript::Serve(statements.to_vec())],
            measures: measures.to_vec(),
        }
    }
}

/// Replays attempt scripts; the last script repeats once they run out.
pub struct ScriptedModel {
    broker: Arc<StubBroker>,
    sender: EventSender,
    coverage: Arc<ScriptedCoverage>,
    scripts: Vec<AttemptScript>,
    attempt: usize,
    step: usize,
}

impl ModelStepper for ScriptedModel {
    fn step(&mut self) -> Result<Step, ModelError> {
        let script = &self.scripts[self.attempt.min(self.scripts.len() - 1)];
        self.sender.emit(
            Level::Info,
            Source::Driver,
            format!("attempt {} step {}", self.attempt + 1, self.step + 1),
        );
        match &script.steps[self.step] {
            StepScript::Serve(statements) => self.broker.request(Command::Serve(
                statements.iter().map(|s| s.to_string()).collect(),
            )),
            StepScript::CloseWithTrailer(trailer) => {
                self.sender
                    .terminated(Source::Driver, "Finishing communications");
                self.sender.emit(Level::Info, Source::Driver, *trailer);
            }
            StepScript::Hang => self.broker.request(Command::Hang),
            StepScript::Fail => {
                return Err(ModelError::Transition("no enabled packet".to_string()))
            }
        }

        self.step += 1;
        if self.step == script.steps.len() {
            self.coverage.set(script.measures.clone());
            self.attempt += 1;
            self.step = 0;
            Ok(Step::Restart)
        } else {
            Ok(Step::Continue)
        }
    }
}

pub type StubSession = GenerationSession<StubBroker, ScriptedModel, Arc<ScriptedCoverage>>;

pub fn config(dir: &Path) -> GenerationConfig {
    GenerationConfig {
        output_dir: dir.join("tests"),
        step_timeout_ms: Some(2_000),
        broker: BrokerConfig::immediate(),
        ..Default::default()
    }
}

pub fn session(config: GenerationConfig, scripts: Vec<AttemptScript>) -> (StubSession, Arc<StubBroker>) {
    let (sender, collector) = config.event_queue();
    let broker = Arc::new(StubBroker::new(sender.clone()));
    let coverage = Arc::new(ScriptedCoverage::default());
    let model = ScriptedModel {
        broker: Arc::clone(&broker),
        sender,
        coverage: Arc::clone(&coverage),
        scripts,
        attempt: 0,
        step: 0,
    };
    let session = GenerationSession::new(config, Arc::clone(&broker), collector, model, coverage)
        .unwrap();
    (session, broker)
}

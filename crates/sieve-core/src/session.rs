//! The generation loop.
//!
//! Each attempt drives the model from a fresh broker state to its next
//! restart point, collecting the transcript step by step. The attempt is
//! kept as a test case only if the leading coverage measures differ from
//! those of the last kept attempt. The broker is reinitialized between
//! attempts and stopped when the session ends, successfully or not.
//!
//! Records already queued when the restart step ends stay with their
//! attempt. Records queued between attempts (startup and reinitialization
//! output) belong to no attempt and are dropped before the next transcript
//! opens. Their arrival positions are still consumed, so a transcript whose
//! first position is not where the previous attempt ended shows the gap.

use std::collections::BTreeSet;
use std::sync::Arc;

use sieve_broker::{BrokerController, BrokerUnderTest};
use sieve_corpus::{TestCorpus, Transcript};
use sieve_model::{CoverageSnapshot, CoverageTracker, ModelStepper};
use sieve_signal::{Collector, ConformanceStatement};
use tracing::{debug, info, trace, warn};

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::limits::{LimitChecker, StopReason};
use crate::report::{AttemptOutcome, AttemptRecord, GenerationReport};

/// Everything one generation run needs, owned in one place.
pub struct GenerationSession<B, M, C>
where
    B: BrokerUnderTest + ?Sized,
    M: ModelStepper,
    C: CoverageTracker,
{
    config: GenerationConfig,
    broker: BrokerController<B>,
    collector: Collector,
    model: M,
    coverage: C,
    attempts: u64,
    stored: u64,
    last_retained: Option<CoverageSnapshot>,
    attempt_log: Vec<AttemptRecord>,
}

impl<B, M, C> GenerationSession<B, M, C>
where
    B: BrokerUnderTest + ?Sized,
    M: ModelStepper,
    C: CoverageTracker,
{
    /// `collector` must be the consumer end of the queue the broker and
    /// model log into. Its wait bound is replaced by the configured one.
    pub fn new(
        config: GenerationConfig,
        broker: Arc<B>,
        mut collector: Collector,
        model: M,
        coverage: C,
    ) -> Result<Self, GenerationError> {
        config.validate()?;
        collector.set_timeout(config.step_timeout());
        let broker = BrokerController::new(broker, config.broker.clone());
        Ok(Self {
            config,
            broker,
            collector,
            model,
            coverage,
            attempts: 0,
            stored: 0,
            last_retained: None,
            attempt_log: Vec::new(),
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run the session to completion.
    ///
    /// On failure the in-flight transcript is deleted and the broker is
    /// stopped before the error is returned. Test cases already stored stay.
    pub fn run(mut self) -> Result<GenerationReport, GenerationError> {
        info!("Generation starting");
        let checker = LimitChecker::new(self.config.limits.clone());
        let corpus = TestCorpus::create(&self.config.output_dir)?;
        let endpoint = self.broker.start()?;
        debug!("Driving broker at {}", endpoint);

        let stop_reason = match self.generate(&corpus, &checker) {
            Ok(reason) => reason,
            Err(err) => {
                warn!(
                    "Generation aborted during attempt {} ({} tests stored): {}",
                    self.attempts, self.stored, err
                );
                if let Err(stop_err) = self.broker.stop() {
                    warn!("Broker did not stop cleanly: {}", stop_err);
                }
                return Err(err);
            }
        };
        self.broker.stop()?;

        let final_measures = self.coverage.measures();
        info!("Final coverage measures {:?}", final_measures);
        info!("Generation complete");

        Ok(GenerationReport {
            output_dir: corpus.dir().to_path_buf(),
            attempts: self.attempts,
            stored_tests: self.stored,
            stop_reason,
            attempt_log: self.attempt_log,
            final_measures,
            elapsed_secs: checker.elapsed_secs(),
        })
    }

    fn generate(
        &mut self,
        corpus: &TestCorpus,
        checker: &LimitChecker,
    ) -> Result<StopReason, GenerationError> {
        loop {
            if let Some(reason) = checker.check(self.stored, self.attempts) {
                debug!(
                    "Stopping after {} attempts with {} tests: {:?}",
                    self.attempts, self.stored, reason
                );
                return Ok(reason);
            }
            self.attempts += 1;
            let record = self.run_attempt(corpus, self.attempts)?;
            self.attempt_log.push(record);
            self.broker.reinitialize()?;
        }
    }

    fn run_attempt(
        &mut self,
        corpus: &TestCorpus,
        attempt: u64,
    ) -> Result<AttemptRecord, GenerationError> {
        let stale = self.collector.drain_pending();
        if stale > 0 {
            debug!("Dropped {} stale records before attempt {}", stale, attempt);
        }

        let mut transcript = corpus.begin(attempt)?;
        let mut statements = BTreeSet::new();
        let steps = match self.drive_to_restart(&mut transcript, &mut statements) {
            Ok(steps) => steps,
            Err(err) => {
                if let Err(discard_err) = corpus.discard(transcript) {
                    warn!("Could not remove transcript of attempt {}: {}", attempt, discard_err);
                }
                return Err(err);
            }
        };
        let transcript_lines = transcript.len();

        let snapshot = self.coverage.snapshot();
        let measures = snapshot.measures().to_vec();
        let outcome = if snapshot.is_novel(self.last_retained.as_ref(), self.config.novelty_width)
        {
            let path = corpus.persist(transcript, &statements)?;
            self.stored += 1;
            self.last_retained = Some(snapshot);
            info!("Test {} created", self.stored);
            debug!(
                "{}: {} statements, measures {:?}",
                path.display(),
                statements.len(),
                measures
            );
            AttemptOutcome::Retained { path }
        } else {
            corpus.discard(transcript)?;
            debug!("Attempt {} discarded, measures {:?}", attempt, measures);
            AttemptOutcome::Discarded
        };

        Ok(AttemptRecord {
            attempt,
            steps,
            statements: statements.iter().map(|s| s.as_str().to_string()).collect(),
            measures,
            transcript_lines,
            outcome,
        })
    }

    /// Step the model until it reports a restart point, then keep whatever
    /// the final step left queued behind its terminator.
    fn drive_to_restart(
        &mut self,
        transcript: &mut Transcript,
        statements: &mut BTreeSet<ConformanceStatement>,
    ) -> Result<u32, GenerationError> {
        let mut steps = 0;
        loop {
            let step = self.model.step()?;
            let capture = self.collector.collect_step()?;
            transcript.append_all(&capture.records)?;
            trace!(
                "Step {} ended by {:?} after {} records",
                steps,
                capture.terminator,
                capture.records.len()
            );
            statements.extend(capture.statements);
            steps += 1;
            if step.is_restart() {
                let trailing = self.collector.take_pending();
                if !trailing.records.is_empty() {
                    debug!("Kept {} records trailing the restart step", trailing.records.len());
                    transcript.append_all(&trailing.records)?;
                    statements.extend(trailing.statements);
                }
                return Ok(steps);
            }
        }
    }
}

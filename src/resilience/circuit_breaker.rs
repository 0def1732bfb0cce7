//! Circuit breaker state agent.
//!
//! # Responsibilities
//! - Own exactly one [`CircuitState`] for the lifetime of a breaker
//! - Serialize trip, reset, is-open, record, recalculate, and admission against any
//!   number of concurrent callers
//! - Log and count every status transition
//!
//! # Design Decisions
//! - One mutex, short critical sections; nothing async or I/O-bound runs under it
//! - Logging and metrics happen after the guard is released
//! - A poisoned mutex is recovered: every operation leaves the state consistent
//!   before it can panic, so the inner value is still valid
//! - The half-open probe is tracked with an RAII guard so a cancelled probe can
//!   never leave the circuit stuck in HalfOpen

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::state::{
    Admission, CircuitSnapshot, CircuitState, CircuitStatus, Transition,
};
use crate::resilience::window::Outcome;

/// Serializing owner of one circuit's state.
#[derive(Debug)]
pub struct StateAgent {
    /// Label used in logs and metrics (the breaker's base URL).
    target: String,
    state: Mutex<CircuitState>,
}

impl StateAgent {
    pub fn new(target: impl Into<String>, config: &BreakerConfig) -> Self {
        let target = target.into();
        let state = CircuitState::new(config, Instant::now());
        metrics::record_circuit_open(&target, state.is_open());
        Self {
            target,
            state: Mutex::new(state),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Force the circuit open.
    pub fn trip(&self) {
        let transition = self.lock().trip(Instant::now());
        self.report(transition, "trip");
    }

    /// Force the circuit closed and clear the outcome window.
    pub fn reset(&self) {
        let transition = self.lock().reset(Instant::now());
        self.report(transition, "reset");
    }

    /// True while the circuit denies ordinary requests (Open or HalfOpen).
    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    pub fn status(&self) -> CircuitStatus {
        self.lock().status()
    }

    /// Record an outcome without re-evaluating the status.
    pub fn record_outcome(&self, outcome: Outcome) {
        self.lock().record_outcome(outcome, Instant::now());
    }

    /// Re-evaluate the status from the window.
    pub fn recalculate(&self) {
        let transition = self.lock().recalculate(Instant::now());
        self.report(transition, "recalculate");
    }

    /// Record an outcome and re-evaluate in a single critical section.
    pub fn observe(&self, outcome: Outcome) {
        let transition = {
            let mut state = self.lock();
            let now = Instant::now();
            state.record_outcome(outcome, now);
            state.recalculate(now)
        };
        self.report(transition, "recalculate");
    }

    /// Ask whether a request may proceed.
    pub fn admit(&self) -> Admission {
        let (admission, transition) = self.lock().admit(Instant::now());
        self.report(transition, "probe");
        admission
    }

    /// Hand out the guard for a request admitted as [`Admission::Probe`].
    pub fn probe(self: &Arc<Self>) -> ProbeGuard {
        ProbeGuard {
            agent: Arc::clone(self),
            finished: false,
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        self.lock().snapshot()
    }

    fn finish_probe(&self, outcome: Outcome) {
        let transition = self.lock().finish_probe(outcome, Instant::now());
        self.report(transition, "probe");
    }

    fn abandon_probe(&self) {
        let transition = self.lock().abandon_probe(Instant::now());
        self.report(transition, "probe abandoned");
    }

    fn lock(&self) -> MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, transition: Option<Transition>, cause: &'static str) {
        let Some(Transition { from, to }) = transition else {
            return;
        };

        match to {
            CircuitStatus::Open => {
                tracing::warn!(target_url = %self.target, %from, %to, cause, "Circuit opened");
            }
            CircuitStatus::HalfOpen => {
                tracing::info!(target_url = %self.target, %from, %to, cause, "Circuit half-open, probing");
            }
            CircuitStatus::Closed => {
                tracing::info!(target_url = %self.target, %from, %to, cause, "Circuit closed");
            }
        }

        metrics::record_transition(&self.target, to);
        metrics::record_circuit_open(&self.target, to != CircuitStatus::Closed);
    }
}

/// Tracks the single in-flight half-open probe.
///
/// Dropping the guard without calling [`ProbeGuard::finish`] sends the circuit
/// back to Open.
#[derive(Debug)]
pub struct ProbeGuard {
    agent: Arc<StateAgent>,
    finished: bool,
}

impl ProbeGuard {
    /// Report the probe's outcome.
    pub fn finish(mut self, outcome: Outcome) {
        self.finished = true;
        self.agent.finish_probe(outcome);
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.agent.abandon_probe();
        }
    }
}

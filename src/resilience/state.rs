//! Circuit state machine.
//!
//! # States
//! - Closed: requests pass through and their outcomes are recorded
//! - Open: requests fail fast and nothing is recorded
//! - HalfOpen: one probe request is in flight, everything else fails fast
//!
//! # State Transitions
//! ```text
//! Closed → Open:     recalculate finds error_rate > error_threshold, or trip()
//! Open → Closed:     recalculate finds error_rate <= error_threshold, or reset()
//! Open → HalfOpen:   admit() after half_open_after has elapsed since opening
//! HalfOpen → Closed: probe succeeds (window cleared)
//! HalfOpen → Open:   probe fails, probe abandoned, or trip()
//! ```
//!
//! Every method takes the current instant explicitly; the agent supplies it.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::resilience::window::{Outcome, OutcomeWindow};

/// Externally visible circuit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitStatus::Closed => "closed",
            CircuitStatus::Open => "open",
            CircuitStatus::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status change produced by one state operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitStatus,
    pub to: CircuitStatus,
}

/// Result of asking whether a request may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed; the outcome feeds the window.
    Allowed,
    /// This request is the single half-open probe.
    Probe,
    /// Fail fast.
    Denied,
}

/// Threshold policy, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitPolicy {
    pub error_threshold: f64,
    pub minimum_requests: u64,
    pub half_open_after: Option<Duration>,
}

impl From<&BreakerConfig> for CircuitPolicy {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            error_threshold: config.error_threshold,
            minimum_requests: config.minimum_requests,
            half_open_after: config.half_open_after(),
        }
    }
}

/// Point-in-time view of a circuit, safe to hand out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub status: CircuitStatus,
    pub error_rate: f64,
    pub successes: u64,
    pub failures: u64,
    pub buckets: usize,
}

/// Status flag, rolling window, and policy for one remote resource.
#[derive(Debug, Clone)]
pub struct CircuitState {
    status: CircuitStatus,
    opened_at: Option<Instant>,
    window: OutcomeWindow,
    policy: CircuitPolicy,
}

impl CircuitState {
    pub fn new(config: &BreakerConfig, now: Instant) -> Self {
        let (status, opened_at) = if config.open {
            (CircuitStatus::Open, Some(now))
        } else {
            (CircuitStatus::Closed, None)
        };
        Self {
            status,
            opened_at,
            window: OutcomeWindow::new(config.window_length, config.bucket_length(), now),
            policy: CircuitPolicy::from(config),
        }
    }

    pub fn status(&self) -> CircuitStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status != CircuitStatus::Closed
    }

    pub fn window(&self) -> &OutcomeWindow {
        &self.window
    }

    pub fn policy(&self) -> &CircuitPolicy {
        &self.policy
    }

    /// Force the circuit open.
    pub fn trip(&mut self, now: Instant) -> Option<Transition> {
        self.set_status(CircuitStatus::Open, now)
    }

    /// Force the circuit closed and forget recorded outcomes, so stale failures
    /// cannot reopen it on the next recalculation.
    pub fn reset(&mut self, now: Instant) -> Option<Transition> {
        self.window.clear();
        self.set_status(CircuitStatus::Closed, now)
    }

    pub fn record_outcome(&mut self, outcome: Outcome, now: Instant) {
        self.window.record(outcome, now);
    }

    /// Re-derive open/closed from the window. A half-open circuit is left alone;
    /// its probe decides the next status.
    pub fn recalculate(&mut self, now: Instant) -> Option<Transition> {
        self.window.expire(now);
        if self.status == CircuitStatus::HalfOpen {
            return None;
        }

        let enough = self.window.total() >= self.policy.minimum_requests;
        let target = if enough && self.window.error_rate() > self.policy.error_threshold {
            CircuitStatus::Open
        } else {
            CircuitStatus::Closed
        };
        self.set_status(target, now)
    }

    /// Decide whether a request may proceed, moving Open → HalfOpen when the
    /// probe delay has elapsed.
    pub fn admit(&mut self, now: Instant) -> (Admission, Option<Transition>) {
        match self.status {
            CircuitStatus::Closed => (Admission::Allowed, None),
            CircuitStatus::HalfOpen => (Admission::Denied, None),
            CircuitStatus::Open => {
                let Some(delay) = self.policy.half_open_after else {
                    return (Admission::Denied, None);
                };
                let elapsed = self
                    .opened_at
                    .map_or(delay, |opened| now.saturating_duration_since(opened));
                if elapsed >= delay {
                    let transition = self.set_status(CircuitStatus::HalfOpen, now);
                    (Admission::Probe, transition)
                } else {
                    (Admission::Denied, None)
                }
            }
        }
    }

    /// Apply the probe's outcome. If a trip or reset overtook the probe, the
    /// outcome is treated like any other observation.
    pub fn finish_probe(&mut self, outcome: Outcome, now: Instant) -> Option<Transition> {
        if self.status != CircuitStatus::HalfOpen {
            self.record_outcome(outcome, now);
            return self.recalculate(now);
        }

        match outcome {
            Outcome::Success => {
                self.window.clear();
                self.set_status(CircuitStatus::Closed, now)
            }
            Outcome::Failure => self.set_status(CircuitStatus::Open, now),
        }
    }

    /// The probe went away without an outcome; go back to Open and restart the delay.
    pub fn abandon_probe(&mut self, now: Instant) -> Option<Transition> {
        if self.status == CircuitStatus::HalfOpen {
            self.set_status(CircuitStatus::Open, now)
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let (successes, failures) = self.window.totals();
        CircuitSnapshot {
            status: self.status,
            error_rate: self.window.error_rate(),
            successes,
            failures,
            buckets: self.window.len(),
        }
    }

    fn set_status(&mut self, to: CircuitStatus, now: Instant) -> Option<Transition> {
        let from = self.status;
        if from == to {
            return None;
        }
        self.status = to;
        self.opened_at = match to {
            CircuitStatus::Open => Some(now),
            CircuitStatus::HalfOpen => self.opened_at,
            CircuitStatus::Closed => None,
        };
        Some(Transition { from, to })
    }
}

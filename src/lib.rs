//! Circuit-breaking HTTP client library.
//!
//! A [`Breaker`] guards one remote resource. Every call is either failed fast while the
//! circuit is open, or dispatched through a [`Transport`] with its outcome fed into a
//! rolling, time-bucketed window that decides when the circuit opens and closes.

// Core subsystems
pub mod config;
pub mod http;
pub mod resilience;

// Cross-cutting concerns
pub mod health;
pub mod observability;

pub use config::{BreakerConfig, ConfigError};
pub use http::{Breaker, BreakerError, RequestOptions, ResponseHandle, Transport};
pub use resilience::{CircuitSnapshot, CircuitStatus, Outcome};

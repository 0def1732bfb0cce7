//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to remote resource:
//!     → circuit_breaker.rs StateAgent::admit (allow, probe, or fail fast)
//!     → [transport call, outside any lock]
//!     → circuit_breaker.rs StateAgent::observe
//!         → window.rs (record outcome in the current bucket)
//!         → state.rs (recalculate: error_rate > error_threshold opens)
//! ```
//!
//! # Design Decisions
//! - Per-breaker state, nothing global
//! - Fail fast while open; denied calls are never recorded
//! - No retries or backoff: the breaker gates, records, and evaluates only

pub mod circuit_breaker;
pub mod state;
pub mod window;

pub use circuit_breaker::{ProbeGuard, StateAgent};
pub use state::{Admission, CircuitSnapshot, CircuitState, CircuitStatus, Transition};
pub use window::{Bucket, Outcome, OutcomeWindow};

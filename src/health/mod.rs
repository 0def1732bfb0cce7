//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Transport call completes (response or error)
//!     → passive.rs (classify as Success / Failure)
//!     → resilience::StateAgent::observe (record + recalculate)
//! ```
//!
//! # Design Decisions
//! - Health is derived only from real traffic; there is no background prober
//! - Classification is per breaker and pluggable

pub mod passive;

pub use passive::{FnClassifier, OutcomeClassifier, PolicyClassifier};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig / BreakerConfig (validated, immutable)
//!     → Breaker::new (validates again, so programmatic configs get the same checks)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a breaker is built; changing policy means a new breaker
//! - All fields except `url` have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, BreakerConfig, FailurePolicy, ObservabilityConfig};
pub use validation::{validate_breaker, ValidationError};

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! State agent and request gate produce:
//!     → tracing events (transitions, denials, transport failures)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Binaries consume:
//!     → logging.rs (subscriber with env filter, optional JSON)
//!     → metrics.rs init_metrics (Prometheus scrape endpoint)
//! ```

pub mod logging;
pub mod metrics;

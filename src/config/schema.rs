//! Configuration schema definitions.
//!
//! This module defines the configuration records consumed by the breaker and the CLI.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the `http-breaker` binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Breaker guarding the remote resource.
    pub breaker: BreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Configuration for a single breaker instance.
///
/// Immutable once a [`Breaker`](crate::http::Breaker) has been built from it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Base URL every request path is resolved against. Required.
    pub url: Option<String>,

    /// Default headers as ordered `[name, value]` pairs.
    pub headers: Vec<(String, String)>,

    /// Default request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Initial circuit state.
    pub open: bool,

    /// Error rate above which the circuit opens, in `[0, 1]`.
    pub error_threshold: f64,

    /// Number of buckets kept in the rolling window.
    pub window_length: usize,

    /// Duration covered by each bucket in milliseconds.
    pub bucket_length_ms: u64,

    /// Which transport results count as failures.
    pub failure_policy: FailurePolicy,

    /// Delay after opening before a single probe request is let through.
    /// Half-open probing is disabled when unset.
    pub half_open_after_ms: Option<u64>,

    /// Outcomes the window must hold before recalculation may open the circuit.
    pub minimum_requests: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            url: None,
            headers: Vec::new(),
            timeout_ms: 3000,
            open: false,
            error_threshold: 0.05,
            window_length: 10,
            bucket_length_ms: 1000,
            failure_policy: FailurePolicy::default(),
            half_open_after_ms: None,
            minimum_requests: 0,
        }
    }
}

impl BreakerConfig {
    /// Defaults with the given base URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn bucket_length(&self) -> Duration {
        Duration::from_millis(self.bucket_length_ms)
    }

    pub fn half_open_after(&self) -> Option<Duration> {
        self.half_open_after_ms.map(Duration::from_millis)
    }
}

/// Classification policy applied to completed transport calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Only transport-level errors (timeouts, connection failures) are failures.
    #[default]
    Transport,
    /// Transport errors and 5xx responses are failures.
    ServerErrors,
    /// Transport errors and any 4xx or 5xx response are failures.
    ErrorStatuses,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Prometheus exporter bind address. Metrics are not exported when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaker_defaults() {
        let config = BreakerConfig::default();
        assert!(config.url.is_none());
        assert_eq!(config.timeout_ms, 3000);
        assert!(!config.open);
        assert_eq!(config.error_threshold, 0.05);
        assert_eq!(config.window_length, 10);
        assert_eq!(config.bucket_length(), Duration::from_millis(1000));
        assert_eq!(config.failure_policy, FailurePolicy::Transport);
        assert!(config.half_open_after().is_none());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [breaker]
            url = "http://example.test/"
            headers = [["accept", "application/json"], ["x-team", "core"]]
            failure_policy = "server_errors"
            "#,
        )
        .unwrap();

        assert_eq!(config.breaker.url.as_deref(), Some("http://example.test/"));
        assert_eq!(config.breaker.headers.len(), 2);
        assert_eq!(config.breaker.headers[1].0, "x-team");
        assert_eq!(config.breaker.failure_policy, FailurePolicy::ServerErrors);
        assert_eq!(config.breaker.window_length, 10);
        assert_eq!(config.observability.log_level, "info");
    }
}

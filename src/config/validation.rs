//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold in [0, 1], lengths and timeouts > 0)
//! - Check that the base URL and default headers are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: BreakerConfig → Result<(), Vec<ValidationError>>
//! - Runs before a breaker is constructed; a running breaker never re-validates

use std::net::SocketAddr;

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, BreakerConfig};

/// A single semantic problem in a configuration record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("breaker url is required")]
    MissingUrl,

    #[error("breaker url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("error_threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("window_length must be greater than zero")]
    ZeroWindowLength,

    #[error("bucket_length_ms must be greater than zero")]
    ZeroBucketLength,

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("half_open_after_ms must be greater than zero when set")]
    ZeroHalfOpenDelay,

    #[error("header '{name}' is invalid: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a breaker configuration.
pub fn validate_breaker(config: &BreakerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.url.as_deref() {
        None => errors.push(ValidationError::MissingUrl),
        Some(raw) if raw.trim().is_empty() => errors.push(ValidationError::MissingUrl),
        Some(raw) => {
            if let Err(e) = Url::parse(raw) {
                errors.push(ValidationError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // NaN fails both comparisons, so test containment rather than the bounds.
    if !(0.0..=1.0).contains(&config.error_threshold) {
        errors.push(ValidationError::ThresholdOutOfRange(config.error_threshold));
    }
    if config.window_length == 0 {
        errors.push(ValidationError::ZeroWindowLength);
    }
    if config.bucket_length_ms == 0 {
        errors.push(ValidationError::ZeroBucketLength);
    }
    if config.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.half_open_after_ms == Some(0) {
        errors.push(ValidationError::ZeroHalfOpenDelay);
    }

    for (name, value) in &config.headers {
        if let Err(e) = HeaderName::from_bytes(name.as_bytes()) {
            errors.push(ValidationError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            });
        } else if let Err(e) = HeaderValue::from_str(value) {
            errors.push(ValidationError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the full application configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match validate_breaker(&config.breaker) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

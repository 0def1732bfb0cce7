//! Request, response, and error types shared by the gate and transports.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

/// A fully resolved call handed to a [`Transport`](crate::http::Transport).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub body: Option<Bytes>,
}

/// A response the transport received, whatever its status code.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    /// Convenience constructor for responses with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Failures raised by the transport before a response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending the request.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Errors surfaced to callers of a [`Breaker`](crate::http::Breaker).
#[derive(Debug, Error)]
pub enum BreakerError {
    /// The circuit is open; the transport was not called.
    #[error("circuit open")]
    OpenCircuit,

    /// Passed through from the transport unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The base URL and path do not form a valid URL.
    #[error("invalid request target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// The dispatched task was cancelled or panicked before producing a result.
    #[error("request task aborted: {0}")]
    Aborted(String),
}

impl BreakerError {
    pub fn is_open_circuit(&self) -> bool {
        matches!(self, BreakerError::OpenCircuit)
    }
}

/// Result type for gated calls.
pub type BreakerResult<T> = Result<T, BreakerError>;

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers that override the breaker defaults on name collision.
    pub headers: HeaderMap,
    /// Overrides the breaker's default timeout.
    pub timeout: Option<Duration>,
    pub body: Option<Bytes>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header; repeated names keep every value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

//! Transport collaborator.
//!
//! # Responsibilities
//! - Perform one HTTP call for a fully resolved [`TransportRequest`]
//! - Enforce the request deadline and report it as [`TransportError::Timeout`]
//!
//! # Design Decisions
//! - The breaker only depends on the trait; the reqwest client is one implementation
//! - Any received response is `Ok`, whatever its status; classification is the
//!   breaker's job, not the transport's

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::types::{TransportError, TransportRequest, TransportResponse};

/// Performs the actual network call for a breaker.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn call(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).call(request).await
    }
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client (connection pool, TLS settings, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn call(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let timeout = request.timeout;
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(error: reqwest::Error, timeout: std::time::Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

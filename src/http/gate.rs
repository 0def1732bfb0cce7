//! Request gate.
//!
//! # Responsibilities
//! - Public entry point for every HTTP verb through one [`Breaker::execute`]
//! - Fail fast while the circuit is open, without touching the transport or the window
//! - Prepare the request (header merge, timeout default, target resolution)
//! - Dispatch the transport call as its own task and feed the outcome back to the agent
//!
//! # Design Decisions
//! - `Breaker` is a cheap handle; clones share one state agent
//! - The agent is consulted before and after the call, never during it
//! - Transport errors are handed back unchanged after being recorded

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use reqwest::header::HeaderMap;
use reqwest::Method;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{validate_breaker, BreakerConfig, ConfigError};
use crate::health::passive::{OutcomeClassifier, PolicyClassifier};
use crate::http::request::{header_map, merge_headers, resolve_target};
use crate::http::transport::{ReqwestTransport, Transport};
use crate::http::types::{
    BreakerError, BreakerResult, RequestOptions, TransportRequest, TransportResponse,
};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{ProbeGuard, StateAgent};
use crate::resilience::state::{Admission, CircuitSnapshot, CircuitStatus};

/// Circuit-breaking client for one remote resource.
#[derive(Clone)]
pub struct Breaker {
    base_url: Arc<str>,
    headers: Arc<HeaderMap>,
    timeout: Duration,
    agent: Arc<StateAgent>,
    transport: Arc<dyn Transport>,
    classifier: Arc<dyn OutcomeClassifier>,
}

impl fmt::Debug for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breaker")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("status", &self.agent.status())
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl Breaker {
    /// Build a breaker that calls out through a default `reqwest` client.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, ReqwestTransport::new())
    }

    /// Build a breaker over a custom transport.
    pub fn with_transport(
        config: BreakerConfig,
        transport: impl Transport,
    ) -> Result<Self, ConfigError> {
        validate_breaker(&config).map_err(ConfigError::Validation)?;
        let headers = header_map(&config.headers).map_err(|e| ConfigError::Validation(vec![e]))?;
        let base_url: Arc<str> = Arc::from(config.url.as_deref().unwrap_or_default());
        let agent = Arc::new(StateAgent::new(&*base_url, &config));

        tracing::debug!(
            target_url = %base_url,
            error_threshold = config.error_threshold,
            window_length = config.window_length,
            bucket_length_ms = config.bucket_length_ms,
            "Breaker created"
        );

        Ok(Self {
            base_url,
            headers: Arc::new(headers),
            timeout: config.timeout(),
            agent,
            transport: Arc::new(transport),
            classifier: Arc::new(PolicyClassifier::new(config.failure_policy)),
        })
    }

    /// Replace the outcome classifier.
    pub fn with_classifier(mut self, classifier: impl OutcomeClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Force the circuit open.
    pub fn trip(&self) {
        self.agent.trip();
    }

    /// Force the circuit closed and clear recorded outcomes.
    pub fn reset(&self) {
        self.agent.reset();
    }

    pub fn is_open(&self) -> bool {
        self.agent.is_open()
    }

    pub fn status(&self) -> CircuitStatus {
        self.agent.status()
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        self.agent.snapshot()
    }

    /// Gate and dispatch one request.
    ///
    /// Must be called from within a Tokio runtime. The call runs on its own task;
    /// dropping the handle does not cancel it, [`ResponseHandle::abort`] does.
    pub fn execute(&self, path: &str, method: Method, options: RequestOptions) -> ResponseHandle {
        let url = match resolve_target(&self.base_url, path) {
            Ok(url) => url,
            Err(e) => return ResponseHandle::ready(Err(e)),
        };

        let probe = match self.agent.admit() {
            Admission::Allowed => None,
            Admission::Probe => Some(self.agent.probe()),
            Admission::Denied => {
                tracing::debug!(target_url = %self.base_url, %method, path, "Circuit open, failing fast");
                metrics::record_short_circuit(&self.base_url, method.as_str());
                return ResponseHandle::ready(Err(BreakerError::OpenCircuit));
            }
        };

        let request = TransportRequest {
            method,
            url,
            headers: merge_headers(&options.headers, &self.headers),
            timeout: options.timeout.unwrap_or(self.timeout),
            body: options.body,
        };

        let span = tracing::info_span!(
            "breaker_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url,
            probe = probe.is_some(),
        );
        let breaker = self.clone();
        let handle = tokio::spawn(breaker.dispatch(request, probe).instrument(span));
        ResponseHandle::spawned(handle)
    }

    pub fn get(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::GET, options)
    }

    pub fn put(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::PUT, options)
    }

    pub fn head(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::HEAD, options)
    }

    pub fn post(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::POST, options)
    }

    pub fn patch(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::PATCH, options)
    }

    pub fn delete(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::DELETE, options)
    }

    pub fn options(&self, path: &str, options: RequestOptions) -> ResponseHandle {
        self.execute(path, Method::OPTIONS, options)
    }

    async fn dispatch(
        self,
        request: TransportRequest,
        probe: Option<ProbeGuard>,
    ) -> BreakerResult<TransportResponse> {
        let method = request.method.clone();
        let start = Instant::now();

        let result = self.transport.call(request).await;
        let outcome = self.classifier.classify(&result);

        match probe {
            Some(probe) => probe.finish(outcome),
            None => self.agent.observe(outcome),
        }
        metrics::record_request(&self.base_url, method.as_str(), outcome, start);

        match &result {
            Ok(response) => tracing::debug!(
                status = %response.status,
                outcome = outcome.as_str(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            ),
            Err(e) => tracing::warn!(error = %e, "Transport call failed"),
        }

        result.map_err(BreakerError::from)
    }
}

/// In-flight (or already decided) result of [`Breaker::execute`].
#[derive(Debug)]
pub struct ResponseHandle {
    inner: HandleInner,
}

#[derive(Debug)]
enum HandleInner {
    Ready(Option<BreakerResult<TransportResponse>>),
    Spawned(JoinHandle<BreakerResult<TransportResponse>>),
}

impl ResponseHandle {
    fn ready(result: BreakerResult<TransportResponse>) -> Self {
        Self {
            inner: HandleInner::Ready(Some(result)),
        }
    }

    fn spawned(handle: JoinHandle<BreakerResult<TransportResponse>>) -> Self {
        Self {
            inner: HandleInner::Spawned(handle),
        }
    }

    /// Cancel the in-flight call. A cancelled call records no outcome.
    pub fn abort(&self) {
        if let HandleInner::Spawned(handle) = &self.inner {
            handle.abort();
        }
    }

    /// True once the result is available without waiting.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            HandleInner::Ready(_) => true,
            HandleInner::Spawned(handle) => handle.is_finished(),
        }
    }
}

impl Future for ResponseHandle {
    type Output = BreakerResult<TransportResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.inner {
            HandleInner::Ready(result) => Poll::Ready(result.take().unwrap_or_else(|| {
                Err(BreakerError::Aborted("result already taken".to_string()))
            })),
            HandleInner::Spawned(handle) => Pin::new(handle)
                .poll(cx)
                .map(|joined| joined.unwrap_or_else(|e| Err(BreakerError::Aborted(e.to_string())))),
        }
    }
}

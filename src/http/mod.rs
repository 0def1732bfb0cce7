//! HTTP request gating subsystem.
//!
//! # Data Flow
//! ```text
//! Caller (path, method, options)
//!     → gate.rs (admission via the state agent; fail fast when open)
//!     → request.rs (merge headers, default timeout, resolve target)
//!     → transport.rs (spawned task performs the call)
//!     → health::passive (classify) → state agent (record + recalculate)
//!     → ResponseHandle resolves with the transport's result
//! ```

pub mod gate;
pub mod request;
pub mod transport;
pub mod types;

pub use gate::{Breaker, ResponseHandle};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    BreakerError, BreakerResult, RequestOptions, TransportError, TransportRequest,
    TransportResponse,
};

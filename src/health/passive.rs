//! Passive health checking (outcome classification).
//!
//! # Responsibilities
//! - Turn every completed transport call into a Success or Failure outcome
//! - Let callers plug in their own definition of failure
//!
//! # Design Decisions
//! - Transport errors (timeouts, refused connections) are always failures
//! - By default any response counts as success, whatever its status
//! - Status-based policies are opt-in: 5xx only, or every 4xx/5xx

use crate::config::FailurePolicy;
use crate::http::types::{TransportError, TransportResponse};
use crate::resilience::window::Outcome;

/// Decides whether a completed call counts against the circuit.
pub trait OutcomeClassifier: Send + Sync + std::fmt::Debug {
    fn classify(&self, result: &Result<TransportResponse, TransportError>) -> Outcome;
}

/// Classifier backed by one of the configured [`FailurePolicy`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyClassifier {
    policy: FailurePolicy,
}

impl PolicyClassifier {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }
}

impl From<FailurePolicy> for PolicyClassifier {
    fn from(policy: FailurePolicy) -> Self {
        Self::new(policy)
    }
}

impl OutcomeClassifier for PolicyClassifier {
    fn classify(&self, result: &Result<TransportResponse, TransportError>) -> Outcome {
        let response = match result {
            Ok(response) => response,
            Err(_) => return Outcome::Failure,
        };

        let failed = match self.policy {
            FailurePolicy::Transport => false,
            FailurePolicy::ServerErrors => response.status.is_server_error(),
            FailurePolicy::ErrorStatuses => {
                response.status.is_client_error() || response.status.is_server_error()
            }
        };

        if failed {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

/// Adapts a plain function into a classifier.
pub struct FnClassifier<F>(pub F);

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnClassifier")
    }
}

impl<F> OutcomeClassifier for FnClassifier<F>
where
    F: Fn(&Result<TransportResponse, TransportError>) -> Outcome + Send + Sync,
{
    fn classify(&self, result: &Result<TransportResponse, TransportError>) -> Outcome {
        (self.0)(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn status(code: u16) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(StatusCode::from_u16(code).unwrap(), ""))
    }

    #[test]
    fn test_transport_policy_ignores_status() {
        let classifier = PolicyClassifier::default();
        assert_eq!(classifier.classify(&status(200)), Outcome::Success);
        assert_eq!(classifier.classify(&status(503)), Outcome::Success);
        assert_eq!(
            classifier.classify(&Err(TransportError::Timeout(Duration::from_secs(1)))),
            Outcome::Failure
        );
    }

    #[test]
    fn test_server_errors_policy() {
        let classifier = PolicyClassifier::new(FailurePolicy::ServerErrors);
        assert_eq!(classifier.classify(&status(404)), Outcome::Success);
        assert_eq!(classifier.classify(&status(500)), Outcome::Failure);
        assert_eq!(
            classifier.classify(&Err(TransportError::Connect("refused".into()))),
            Outcome::Failure
        );
    }

    #[test]
    fn test_error_statuses_policy() {
        let classifier = PolicyClassifier::from(FailurePolicy::ErrorStatuses);
        assert_eq!(classifier.classify(&status(204)), Outcome::Success);
        assert_eq!(classifier.classify(&status(429)), Outcome::Failure);
        assert_eq!(classifier.classify(&status(502)), Outcome::Failure);
    }

    #[test]
    fn test_fn_classifier() {
        let classifier = FnClassifier(|result: &Result<TransportResponse, TransportError>| {
            match result {
                Ok(r) if r.status == StatusCode::TOO_MANY_REQUESTS => Outcome::Failure,
                Ok(_) => Outcome::Success,
                Err(_) => Outcome::Failure,
            }
        });
        assert_eq!(classifier.classify(&status(429)), Outcome::Failure);
        assert_eq!(classifier.classify(&status(500)), Outcome::Success);
    }
}

//! Request preparation.
//!
//! # Responsibilities
//! - Build the breaker's default header map from configured pairs
//! - Merge per-call headers over the defaults
//! - Resolve the final target URL from base URL and path
//!
//! # Design Decisions
//! - Header merge is an explicit map merge: a per-call name replaces every default
//!   value for that name, instead of relying on list order
//! - Base URL and path are joined with exactly one `/`, so a base path prefix is kept
//!   (unlike `Url::join`, which drops it for absolute paths)

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::ValidationError;
use crate::http::types::{BreakerError, BreakerResult};

/// Build a header map from ordered `(name, value)` pairs. Repeated names keep every value.
pub fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap, ValidationError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let invalid = |reason: String| ValidationError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

/// Merge per-call headers over breaker defaults; per-call entries win on collision.
pub fn merge_headers(per_call: &HeaderMap, defaults: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for name in per_call.keys() {
        merged.remove(name);
    }
    for (name, value) in per_call {
        merged.append(name.clone(), value.clone());
    }
    merged
}

/// Join the base URL and a request path into the final target.
pub fn resolve_target(base: &str, path: &str) -> BreakerResult<Url> {
    let target = if path.is_empty() {
        base.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    Url::parse(&target).map_err(|source| BreakerError::InvalidTarget { target, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HeaderMap {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        header_map(&owned).unwrap()
    }

    #[test]
    fn test_per_call_headers_win() {
        let defaults = map(&[("accept", "text/plain"), ("x-team", "core"), ("x-team", "edge")]);
        let per_call = map(&[("X-Team", "payments"), ("x-trace", "abc")]);

        let merged = merge_headers(&per_call, &defaults);
        assert_eq!(merged.get("accept").unwrap(), "text/plain");
        let teams: Vec<_> = merged.get_all("x-team").iter().collect();
        assert_eq!(teams, vec!["payments"]);
        assert_eq!(merged.get("x-trace").unwrap(), "abc");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_with_empty_inputs() {
        let defaults = map(&[("accept", "text/plain")]);
        assert_eq!(merge_headers(&HeaderMap::new(), &defaults), defaults);
        assert_eq!(merge_headers(&defaults, &HeaderMap::new()), defaults);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let err = header_map(&[("bad name".into(), "v".into())]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidHeader { ref name, .. } if name == "bad name"));
    }

    #[test]
    fn test_resolve_target_single_slash() {
        let url = resolve_target("http://example.test/", "/ok").unwrap();
        assert_eq!(url.as_str(), "http://example.test/ok");

        let url = resolve_target("http://example.test", "ok").unwrap();
        assert_eq!(url.as_str(), "http://example.test/ok");
    }

    #[test]
    fn test_resolve_target_keeps_base_path_and_query() {
        let url = resolve_target("http://example.test/api/v1/", "/users?page=2").unwrap();
        assert_eq!(url.path(), "/api/v1/users");
        assert_eq!(url.query(), Some("page=2"));
    }

    #[test]
    fn test_resolve_target_empty_path() {
        let url = resolve_target("http://example.test/api", "").unwrap();
        assert_eq!(url.as_str(), "http://example.test/api");
    }

    #[test]
    fn test_resolve_target_invalid() {
        let err = resolve_target("example", "/ok").unwrap_err();
        assert!(matches!(err, BreakerError::InvalidTarget { ref target, .. } if target == "example/ok"));
    }
}

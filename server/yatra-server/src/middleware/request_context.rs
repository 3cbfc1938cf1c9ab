//! Per-request metadata extracted from headers

use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request metadata used for log correlation and audit rows
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Caller-supplied `X-Request-ID`, or a generated one
    pub request_id: String,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            remote_addr: None,
            user_agent: None,
        }
    }

    /// Build a context from request headers
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        };

        let remote_addr = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .or_else(|| header("x-real-ip"));

        Self {
            request_id: header(REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string()),
            remote_addr,
            user_agent: header("user-agent"),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_context_new() {
        let ctx = RequestContext::new();
        assert!(!ctx.request_id.is_empty());
        assert!(ctx.remote_addr.is_none());
    }

    #[test]
    fn test_request_id_is_taken_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        headers.insert("user-agent", HeaderValue::from_static("yatra-tests"));

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.request_id, "req-42");
        assert_eq!(ctx.remote_addr.as_deref(), Some("10.0.0.7"));
        assert_eq!(ctx.user_agent.as_deref(), Some("yatra-tests"));
    }

    #[test]
    fn test_missing_request_id_is_generated() {
        let ctx = RequestContext::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }
}

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::request_context::REQUEST_ID_HEADER;

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = elapsed.as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

/// Audit logging middleware
///
/// Records every mutating request and echoes the request id back to the
/// caller. The token itself is never logged.
pub async fn audit_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToString::to_string);
    let authenticated = request.headers().contains_key(header::AUTHORIZATION);
    let mutating = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);

    let mut response = next.run(request).await;

    if mutating {
        tracing::info!(
            method = %method,
            uri = %uri,
            request_id = %request_id,
            authenticated,
            status = response.status().as_u16(),
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "Audit log: mutating request"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Create CORS layer for the application
///
/// An empty origin list allows any origin; unparsable origins are skipped.
#[must_use]
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(Duration::from_secs(3600))
}

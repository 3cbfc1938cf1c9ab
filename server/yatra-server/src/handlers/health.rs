use axum::{extract::State, http::StatusCode, Json};
use database_layer::DatabasePool;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::error::{api_success, ApiResponse};
use crate::server::YatraServer;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system health status
    #[schema(example = "healthy")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2026-10-19T10:30:00Z")]
    pub timestamp: String,
    /// API version
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Individual dependency checks
    pub checks: HashMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    /// Application name
    #[schema(example = "YatraSathi")]
    pub name: String,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Enabled modules
    pub features: Vec<String>,
}

/// Health check handler
///
/// Answers 503 when the database cannot be reached.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "System is healthy", body = HealthResponse),
        (status = 503, description = "System is unhealthy", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(server): State<YatraServer>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database_ok = DatabasePool::from_pool(server.db_pool.clone())
        .is_healthy()
        .await;

    let mut checks = HashMap::new();
    checks.insert(
        "database".to_string(),
        if database_ok { "healthy" } else { "unreachable" }.to_string(),
    );

    let (status_code, status) = if database_ok {
        (StatusCode::OK, "healthy")
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    };

    (status_code, Json(api_success(response)))
}

/// Version information handler
#[utoipa::path(
    get,
    path = "/version",
    tag = "health",
    responses(
        (status = 200, description = "Version information", body = VersionResponse)
    )
)]
pub async fn version_info(State(server): State<YatraServer>) -> Json<ApiResponse<VersionResponse>> {
    let response = VersionResponse {
        name: server.config.server.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: [
            "bookings",
            "billing",
            "payments",
            "accounting",
            "reports",
            "dashboards",
        ]
        .iter()
        .map(ToString::to_string)
        .collect(),
    };

    Json(api_success(response))
}

//! YatraSathi Server - travel agency back-office API
//!
//! This library provides the HTTP surface of the YatraSathi engine:
//! authentication, bookings, billing, payments, accounting, reports and
//! role dashboards.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::*;
pub use server::YatraServer;

use axum::{middleware::from_fn, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Create the main application router with all routes and middleware
pub fn create_app(server: YatraServer) -> Router {
    let cors = middleware::create_cors_layer(&server.config.server.cors_origins);
    let timeout = Duration::from_secs(server.config.server.request_timeout_secs);

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(timeout))
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(from_fn(middleware::audit_logging_middleware)),
        )
        .with_state(server)
}

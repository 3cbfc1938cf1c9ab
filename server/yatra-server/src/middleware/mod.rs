//! Middleware modules for request processing

pub mod auth_context;
pub mod logging;
pub mod request_context;

pub use auth_context::{AccessScope, AuthContext};
pub use logging::{audit_logging_middleware, create_cors_layer, request_timing_middleware};
pub use request_context::RequestContext;

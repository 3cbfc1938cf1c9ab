//! Common error handling utilities for the YatraSathi engine
//!
//! Shared by the domain crates and the HTTP server so that every layer
//! reports failures with the same categories and machine-readable codes.
//!
//! # Error Categories
//!
//! - **Validation**: malformed input, missing required fields
//! - **Authentication / Authorization**: bad credentials, missing permissions
//! - **NotFound / Conflict**: missing records, workflow and uniqueness violations
//! - **Database**: connection and query failures
//! - **Config / Internal**: startup and infrastructure failures
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ErrorContext, YatraError};
//!
//! fn require_origin(origin: &str) -> error_common::Result<()> {
//!     if origin.trim().is_empty() {
//!         return Err(YatraError::ValidationError("origin is required".into()));
//!     }
//!     Ok(())
//! }
//!
//! let err = require_origin("").unwrap_err();
//! assert_eq!(err.code(), codes::validation::MISSING_REQUIRED_FIELD);
//!
//! let ctx = ErrorContext::new().add_context("field", "origin");
//! error_common::log_error(&ctx, &err);
//! ```

pub mod codes;
pub mod context;
pub mod types;

pub use context::*;
pub use types::*;

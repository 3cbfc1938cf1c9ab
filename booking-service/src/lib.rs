//! Booking Service for travel reservations
//!
//! Provides the booking side of the back office:
//! - Booking and passenger models
//! - The DRAFT -> CONFIRMED -> COMPLETED / CANCELLED workflow with guards
//! - Intake validation for new and edited bookings

pub mod error;
pub mod models;
pub mod service;
pub mod workflow;

pub use error::*;
pub use models::*;
pub use service::*;
pub use workflow::*;

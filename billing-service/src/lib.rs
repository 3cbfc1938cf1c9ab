//! Billing Service for travel bookings
//!
//! Provides the receivables side of the back office:
//! - Invoice computation (fare, service charge, GST, other charges, discount)
//! - Billing status derived from amounts received
//! - Equal-split payment allocation with rounding adjustment
//! - Outstanding, aging and collection summaries

pub mod error;
pub mod models;
pub mod payment;
pub mod reporting;
pub mod service;

pub use error::*;
pub use models::*;
pub use payment::*;
pub use reporting::*;
pub use service::*;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a money amount to paise, half away from zero
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

//! Accounting Service for the travel back office
//!
//! Provides the books behind bookings and payments:
//! - Contra, payment, receipt and journal vouchers with posting lines
//! - Read-time ledger balances and running-balance statements
//! - Trial balance
//! - Automatic postings for billings and receipts against the system chart

pub mod error;
pub mod ledger;
pub mod models;
pub mod posting;
pub mod reporting;
pub mod service;

pub use error::*;
pub use ledger::*;
pub use models::*;
pub use posting::*;
pub use reporting::*;
pub use service::*;

pub mod accounting;
pub mod auth;
pub mod billing;
pub mod bookings;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod payments;
pub mod receipts;
pub mod reports;
pub mod users;

pub mod paths;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{
        accounting, auth, billing, bookings, customers, dashboard, health, payments, receipts,
        reports, users,
    },
    openapi,
    server::YatraServer,
};

/// Create health check routes
pub fn health_routes() -> Router<YatraServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
}

/// Create authentication routes
pub fn auth_routes() -> Router<YatraServer> {
    Router::new()
        .route(paths::auth::REGISTER, post(auth::register))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::ME, get(auth::me))
        .route(paths::auth::CHANGE_PASSWORD, post(auth::change_password))
}

/// Create user administration routes
pub fn user_routes() -> Router<YatraServer> {
    Router::new()
        .route(
            paths::users::USERS,
            get(users::list_users).post(users::create_user),
        )
        .route(
            paths::users::USER_BY_ID,
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
}

/// Create customer routes
pub fn customer_routes() -> Router<YatraServer> {
    Router::new()
        .route(
            paths::customers::CUSTOMERS,
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            paths::customers::CUSTOMER_BY_ID,
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
}

/// Create booking routes, including the workflow transitions
pub fn booking_routes() -> Router<YatraServer> {
    Router::new()
        .route(
            paths::bookings::BOOKINGS,
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            paths::bookings::BOOKING_BY_ID,
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route(paths::bookings::CONFIRM, post(bookings::confirm_booking))
        .route(paths::bookings::CANCEL, post(bookings::cancel_booking))
        .route(paths::bookings::COMPLETE, post(bookings::complete_booking))
}

/// Create billing routes
pub fn billing_routes() -> Router<YatraServer> {
    Router::new()
        .route(
            paths::billing::BILLINGS,
            get(billing::list_billings).post(billing::generate_billing),
        )
        .route(
            paths::billing::BILLING_BY_ID,
            get(billing::get_billing).put(billing::update_billing),
        )
        .route(paths::billing::FARE_SPLIT, get(billing::fare_split))
}

/// Create payment and receipt routes
pub fn payment_routes() -> Router<YatraServer> {
    Router::new()
        .route(
            paths::payments::PAYMENTS,
            get(payments::list_payments).post(payments::record_payment),
        )
        .route(
            paths::payments::ALLOCATION_PREVIEW,
            get(payments::allocation_preview),
        )
        .route(paths::payments::PAYMENT_BY_ID, get(payments::get_payment))
        .route(paths::payments::RECEIPTS, get(receipts::list_receipts))
        .route(paths::payments::RECEIPT_BY_ID, get(receipts::get_receipt))
}

/// Create ledger and voucher routes
pub fn accounting_routes() -> Router<YatraServer> {
    Router::new()
        .route(
            paths::accounting::ACCOUNTS,
            get(accounting::list_accounts).post(accounting::create_account),
        )
        .route(
            paths::accounting::ACCOUNT_BALANCE,
            get(accounting::account_balance),
        )
        .route(
            paths::accounting::ACCOUNT_STATEMENT,
            get(accounting::account_statement),
        )
        .route(
            paths::accounting::VOUCHERS,
            get(accounting::list_vouchers).post(accounting::create_voucher),
        )
        .route(
            paths::accounting::VOUCHER_BY_ID,
            get(accounting::get_voucher).delete(accounting::delete_voucher),
        )
        .route(
            paths::accounting::TRIAL_BALANCE,
            get(accounting::get_trial_balance),
        )
}

/// Create report routes
pub fn report_routes() -> Router<YatraServer> {
    Router::new()
        .route(paths::reports::BOOKINGS, get(reports::bookings_report))
        .route(paths::reports::OUTSTANDING, get(reports::outstanding_report))
        .route(paths::reports::COLLECTIONS, get(reports::collections_report))
        .route(
            paths::reports::CUSTOMER_AGING,
            get(reports::customer_aging_report),
        )
        .route(
            paths::reports::TRIAL_BALANCE,
            get(reports::trial_balance_report),
        )
        .route(
            paths::reports::ACCOUNT_STATEMENT,
            get(reports::account_statement_report),
        )
}

/// Create API v1 routes
pub fn api_v1_routes() -> Router<YatraServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .nest(paths::auth::PREFIX, auth_routes())
        .merge(user_routes())
        .merge(customer_routes())
        .merge(booking_routes())
        .merge(billing_routes())
        .merge(payment_routes())
        .merge(accounting_routes())
        .merge(report_routes())
        .route(paths::dashboard::DASHBOARD, get(dashboard::get_dashboard))
}

/// Create all application routes
pub fn create_routes() -> Router<YatraServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        // API documentation routes
        .merge(openapi::create_docs_routes())
        // API v1 routes (authentication enforced per handler)
        .nest(paths::API_V1, api_v1_routes())
}

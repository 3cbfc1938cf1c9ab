use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::paths;
use crate::server::YatraServer;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::handlers::health::health_check,
        crate::handlers::health::version_info,

        // Authentication endpoints
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::change_password,

        // User administration
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::deactivate_user,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        // Bookings
        crate::handlers::bookings::list_bookings,
        crate::handlers::bookings::get_booking,
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::update_booking,
        crate::handlers::bookings::delete_booking,
        crate::handlers::bookings::confirm_booking,
        crate::handlers::bookings::cancel_booking,
        crate::handlers::bookings::complete_booking,

        // Billing
        crate::handlers::billing::list_billings,
        crate::handlers::billing::get_billing,
        crate::handlers::billing::generate_billing,
        crate::handlers::billing::update_billing,
        crate::handlers::billing::fare_split,

        // Payments and receipts
        crate::handlers::payments::list_payments,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::record_payment,
        crate::handlers::payments::allocation_preview,
        crate::handlers::receipts::list_receipts,
        crate::handlers::receipts::get_receipt,

        // Accounting
        crate::handlers::accounting::list_accounts,
        crate::handlers::accounting::create_account,
        crate::handlers::accounting::account_balance,
        crate::handlers::accounting::account_statement,
        crate::handlers::accounting::list_vouchers,
        crate::handlers::accounting::get_voucher,
        crate::handlers::accounting::create_voucher,
        crate::handlers::accounting::delete_voucher,
        crate::handlers::accounting::get_trial_balance,

        // Reports
        crate::handlers::reports::bookings_report,
        crate::handlers::reports::outstanding_report,
        crate::handlers::reports::collections_report,
        crate::handlers::reports::customer_aging_report,
        crate::handlers::reports::trial_balance_report,
        crate::handlers::reports::account_statement_report,

        // Dashboard
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            // Envelope
            crate::error::ApiErrorResponse,
            crate::error::ResponseMetadata,
            crate::error::PaginationInfo,

            // Health schemas
            crate::handlers::health::HealthResponse,
            crate::handlers::health::VersionResponse,

            // Authentication schemas
            crate::auth::RoleCode,
            crate::auth::UserType,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::ChangePasswordRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserProfile,
            crate::handlers::users::UserAccount,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,

            // Customer and booking schemas
            crate::handlers::customers::Customer,
            crate::handlers::customers::CreateCustomerRequest,
            crate::handlers::customers::UpdateCustomerRequest,
            booking_service::BookingStatus,
            booking_service::Gender,
            booking_service::PassengerInput,
            booking_service::BookingDraft,
            booking_service::BookingChanges,
            crate::handlers::bookings::Booking,
            crate::handlers::bookings::Passenger,
            crate::handlers::bookings::BookingDetail,
            crate::handlers::bookings::CreateBookingRequest,

            // Billing and payment schemas
            billing_service::BillingStatus,
            billing_service::PaymentMode,
            billing_service::AllocationLine,
            crate::handlers::billing::Billing,
            crate::handlers::billing::BillingDetail,
            crate::handlers::billing::AppliedPayment,
            crate::handlers::billing::GenerateBillingRequest,
            crate::handlers::billing::AdjustBillingRequest,
            crate::handlers::billing::PassengerShare,
            crate::handlers::billing::FareSplit,
            crate::handlers::payments::Payment,
            crate::handlers::payments::PaymentAllocation,
            crate::handlers::payments::PaymentDetail,
            crate::handlers::payments::RecordPaymentRequest,
            crate::handlers::payments::AllocationPreview,
            crate::handlers::receipts::Receipt,
            crate::handlers::receipts::ReceiptDetail,

            // Accounting schemas
            accounting_service::AccountType,
            accounting_service::VoucherType,
            accounting_service::EntryType,
            accounting_service::VoucherInput,
            accounting_service::VoucherLineInput,
            accounting_service::AccountBalance,
            accounting_service::AccountStatement,
            accounting_service::StatementLine,
            accounting_service::TrialBalance,
            accounting_service::TrialBalanceRow,
            crate::handlers::accounting::LedgerAccount,
            crate::handlers::accounting::CreateAccountRequest,
            crate::handlers::accounting::Voucher,
            crate::handlers::accounting::VoucherEntry,
            crate::handlers::accounting::VoucherDetail,
            crate::handlers::accounting::CreateVoucherRequest,

            // Reports and dashboard
            crate::services::ReportFormat,
            crate::handlers::dashboard::Dashboard,
            crate::handlers::dashboard::DashboardView,
            crate::handlers::dashboard::StatusCount,
            crate::handlers::dashboard::Receivables,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and version endpoints"),
        (name = "authentication", description = "Registration, login and the current user"),
        (name = "users", description = "Staff and customer user administration"),
        (name = "customers", description = "Customer profiles"),
        (name = "bookings", description = "Travel bookings and their workflow"),
        (name = "billing", description = "Invoices raised from confirmed bookings"),
        (name = "payments", description = "Payments, allocations and receipts"),
        (name = "accounting", description = "Ledger accounts, vouchers and trial balance"),
        (name = "reports", description = "Reports as JSON, CSV, XLSX or PDF"),
        (name = "dashboard", description = "Role-specific summaries"),
    ),
    info(
        title = "YatraSathi API",
        version = "0.1.0",
        description = "Travel agency back office: bookings, billing, payments and accounting.",
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by secured operations
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create OpenAPI documentation routes
pub fn create_docs_routes() -> Router<YatraServer> {
    Router::new()
        .merge(SwaggerUi::new(paths::docs::SWAGGER_UI).url(paths::docs::OPENAPI_JSON, ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_secured_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/bookings/{id}/confirm"));
        assert!(doc.paths.paths.contains_key("/api/v1/accounting/trial-balance"));
        assert!(doc.paths.paths.contains_key("/health"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}

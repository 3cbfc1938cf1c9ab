//! Centralized API route path constants
//!
//! Runtime routes use these constants. utoipa `#[utoipa::path(...)]`
//! attributes need string literals, so the documented paths repeat them
//! with `{id}` in place of `:id` and the `/api/v1` prefix included.

/// API base path
pub const API_V1: &str = "/api/v1";

/// Health check endpoints
pub mod health {
    pub const HEALTH: &str = "/health";
    pub const VERSION: &str = "/version";
}

/// Authentication endpoints, nested under `/auth`
pub mod auth {
    pub const PREFIX: &str = "/auth";
    pub const REGISTER: &str = "/register";
    pub const LOGIN: &str = "/login";
    pub const ME: &str = "/me";
    pub const CHANGE_PASSWORD: &str = "/change-password";
}

pub mod users {
    pub const USERS: &str = "/users";
    pub const USER_BY_ID: &str = "/users/:id";
}

pub mod customers {
    pub const CUSTOMERS: &str = "/customers";
    pub const CUSTOMER_BY_ID: &str = "/customers/:id";
}

pub mod bookings {
    pub const BOOKINGS: &str = "/bookings";
    pub const BOOKING_BY_ID: &str = "/bookings/:id";
    pub const CONFIRM: &str = "/bookings/:id/confirm";
    pub const CANCEL: &str = "/bookings/:id/cancel";
    pub const COMPLETE: &str = "/bookings/:id/complete";
}

pub mod billing {
    pub const BILLINGS: &str = "/billing";
    pub const BILLING_BY_ID: &str = "/billing/:id";
    pub const FARE_SPLIT: &str = "/billing/:id/fare-split";
}

pub mod payments {
    pub const PAYMENTS: &str = "/payments";
    pub const PAYMENT_BY_ID: &str = "/payments/:id";
    pub const ALLOCATION_PREVIEW: &str = "/payments/allocation-preview";
    pub const RECEIPTS: &str = "/receipts";
    pub const RECEIPT_BY_ID: &str = "/receipts/:id";
}

pub mod accounting {
    pub const ACCOUNTS: &str = "/accounting/accounts";
    pub const ACCOUNT_BALANCE: &str = "/accounting/accounts/:id/balance";
    pub const ACCOUNT_STATEMENT: &str = "/accounting/accounts/:id/statement";
    pub const VOUCHERS: &str = "/accounting/vouchers";
    pub const VOUCHER_BY_ID: &str = "/accounting/vouchers/:id";
    pub const TRIAL_BALANCE: &str = "/accounting/trial-balance";
}

pub mod reports {
    pub const BOOKINGS: &str = "/reports/bookings";
    pub const OUTSTANDING: &str = "/reports/outstanding";
    pub const COLLECTIONS: &str = "/reports/collections";
    pub const CUSTOMER_AGING: &str = "/reports/customer-aging";
    pub const TRIAL_BALANCE: &str = "/reports/trial-balance";
    pub const ACCOUNT_STATEMENT: &str = "/reports/account-statement";
}

pub mod dashboard {
    pub const DASHBOARD: &str = "/dashboard";
}

/// Documentation endpoints
pub mod docs {
    pub const SWAGGER_UI: &str = "/swagger-ui";
    pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_segments_do_not_collide_with_ids() {
        // `/payments/allocation-preview` must stay a literal route next to `/payments/:id`
        assert!(!payments::ALLOCATION_PREVIEW.contains(':'));
        assert!(payments::PAYMENT_BY_ID.ends_with("/:id"));
    }
}

use accounting_service::AccountingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use billing_service::BillingError;
use booking_service::BookingError;
use database_layer::{constraint_violation, ConstraintViolation, DatabaseError};
use error_common::codes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Always `false` for errors
    pub success: bool,
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type
    pub error_type: String,
    /// Machine-readable error code
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, Vec<String>>>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Suggested actions for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Response metadata for pagination
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error("Resource not found: {resource_type}")]
    NotFound { resource_type: String },

    #[error("Resource conflict: {message}")]
    Conflict { message: String, code: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(
        message: impl Into<String>,
        field_errors: HashMap<String, Vec<String>>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    /// Create a conflict error for workflow and state violations
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            code: codes::business::INVALID_STATE_TRANSITION,
        }
    }

    /// Create a conflict error for an existing record
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            code: codes::business::DUPLICATE_RECORD,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Database(db_err) => match db_err {
                DatabaseError::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::SqlxError(sqlx::Error::PoolTimedOut) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error type string
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Database(_) => "database_error",
            ApiError::Internal { .. } => "internal_error",
            ApiError::ServiceUnavailable { .. } => "service_unavailable",
            ApiError::BadRequest { .. } => "bad_request",
        }
    }

    /// Machine-readable code from the shared code table
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => codes::validation::INVALID_INPUT,
            ApiError::BadRequest { .. } => codes::validation::INVALID_FORMAT,
            ApiError::Authentication { .. } => codes::authentication::TOKEN_INVALID,
            ApiError::Authorization { .. } => codes::authorization::INSUFFICIENT_PERMISSIONS,
            ApiError::NotFound { .. } => codes::business::NOT_FOUND,
            ApiError::Conflict { code, .. } => *code,
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => {
                codes::database::CONNECTION_FAILED
            }
            ApiError::Database(_) => codes::database::QUERY_FAILED,
            ApiError::Internal { .. } => codes::system::INTERNAL,
            ApiError::ServiceUnavailable { .. } => codes::system::SERVICE_UNAVAILABLE,
        }
    }

    /// Get suggested actions for resolving the error
    #[must_use]
    pub fn suggestions(&self) -> Option<Vec<String>> {
        match self {
            ApiError::Validation { .. } => Some(vec![
                "Check the request payload for invalid fields".to_string(),
                "Ensure all required fields are provided".to_string(),
            ]),
            ApiError::Authentication { .. } => Some(vec![
                "Log in again to obtain a fresh token".to_string(),
                "Send the token as 'Authorization: Bearer <token>'".to_string(),
            ]),
            ApiError::Authorization { .. } => Some(vec![
                "Check if your role allows this operation".to_string(),
                "Contact your administrator for access".to_string(),
            ]),
            ApiError::NotFound { .. } => Some(vec!["Verify the resource ID is correct".to_string()]),
            ApiError::Conflict { .. } => Some(vec![
                "Reload the record and check its current status".to_string(),
            ]),
            ApiError::Database(DatabaseError::ConnectionFailed(_))
            | ApiError::ServiceUnavailable { .. } => Some(vec![
                "Try again in a few moments".to_string(),
                "Contact support if the issue persists".to_string(),
            ]),
            _ => None,
        }
    }

    /// User-facing text for database errors; driver details stay in the logs
    #[must_use]
    pub fn format_database_error(db_error: &DatabaseError) -> String {
        match db_error {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to connect to the database.".to_string()
            }
            DatabaseError::SqlxError(sqlx::Error::RowNotFound) => {
                "Requested record not found.".to_string()
            }
            DatabaseError::SqlxError(sqlx::Error::PoolTimedOut) => {
                "The database is busy. Please try again.".to_string()
            }
            DatabaseError::QueryFailed(msg) if msg.contains("check constraint") => {
                "The provided data does not meet validation requirements.".to_string()
            }
            _ => "Database operation failed. Please try again.".to_string(),
        }
    }
}

/// Explain which dependency blocks a write, from the constraint name
#[must_use]
pub fn describe_constraint(violation: &ConstraintViolation) -> ApiError {
    match violation {
        ConstraintViolation::ForeignKey { constraint } => {
            let blocker = match constraint.as_deref() {
                Some("billings_booking_id_fkey") => "a billing exists for this booking",
                Some("payments_booking_id_fkey") => "payments are recorded against this booking",
                Some("passengers_booking_id_fkey") => "passengers are attached to this booking",
                Some("bookings_customer_id_fkey") => "bookings exist for this customer",
                Some("billings_customer_id_fkey") => "billings exist for this customer",
                Some("payments_customer_id_fkey") => "payments exist for this customer",
                Some("payment_allocations_billing_id_fkey") => {
                    "payments are allocated to this billing"
                }
                Some("voucher_entries_ledger_account_id_fkey")
                | Some("vouchers_ledger_account_id_fkey")
                | Some("vouchers_counter_account_id_fkey") => {
                    "vouchers are posted to this ledger account"
                }
                Some("customers_user_id_fkey") => "a customer profile is linked to this user",
                _ => "other records still reference it",
            };
            ApiError::Conflict {
                message: format!("Record cannot be changed or deleted: {blocker}"),
                code: codes::database::FOREIGN_KEY_VIOLATION,
            }
        }
        ConstraintViolation::Unique { constraint } => {
            let what = match constraint.as_deref() {
                Some("billings_booking_id_key") => "A billing already exists for this booking",
                Some("users_email_key") => "A user with this email already exists",
                Some("ledger_accounts_code_key") => "A ledger account with this code already exists",
                Some("vouchers_voucher_number_key") => "This voucher number is already in use",
                Some("customers_user_id_key") => "This user already has a customer profile",
                _ => "A record with these details already exists",
            };
            ApiError::duplicate(what)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let field_errors = match &self {
            ApiError::Validation { field_errors, .. } => field_errors.clone(),
            _ => None,
        };

        let message = match &self {
            ApiError::Database(db_err) => ApiError::format_database_error(db_err),
            ApiError::Internal { .. } => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        let error_response = ApiErrorResponse {
            success: false,
            error_id,
            error_type: self.error_type().to_string(),
            error_code: self.error_code().to_string(),
            message,
            field_errors,
            timestamp: chrono::Utc::now(),
            suggestions: self.suggestions(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        message: None,
        metadata: None,
    }
}

/// Helper function to create successful API responses with metadata
pub fn api_success_with_meta<T>(data: T, metadata: ResponseMetadata) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        message: None,
        metadata: Some(metadata),
    }
}

/// Convert SQLx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(sqlx_error: sqlx::Error) -> Self {
        if let Some(violation) = constraint_violation(&sqlx_error) {
            return describe_constraint(&violation);
        }
        match sqlx_error {
            sqlx::Error::RowNotFound => ApiError::not_found("record"),
            other => ApiError::Database(DatabaseError::SqlxError(other)),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Internal {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::BadRequest {
            message: format!("Invalid JSON: {error}"),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(_) | BookingError::UnknownStatus(_) => {
                ApiError::validation(err.to_string())
            }
            other => ApiError::conflict(other.to_string()),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidStatus(_) => ApiError::conflict(err.to_string()),
            BillingError::OverAllocation { .. } => ApiError::Validation {
                message: err.to_string(),
                field_errors: Some(HashMap::from([(
                    "billing_ids".to_string(),
                    vec![codes::business::OVER_ALLOCATION.to_string()],
                )])),
            },
            other => ApiError::validation(other.to_string()),
        }
    }
}

impl From<AccountingError> for ApiError {
    fn from(err: AccountingError) -> Self {
        match err {
            AccountingError::Unbalanced { .. } => ApiError::Validation {
                message: err.to_string(),
                field_errors: Some(HashMap::from([(
                    "ledger_entries".to_string(),
                    vec![codes::business::UNBALANCED_VOUCHER.to_string()],
                )])),
            },
            other => ApiError::validation(other.to_string()),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::authentication("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::authorization("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("booking").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn foreign_key_violation_names_the_dependency() {
        let err = describe_constraint(&ConstraintViolation::ForeignKey {
            constraint: Some("billings_booking_id_fkey".to_string()),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), codes::database::FOREIGN_KEY_VIOLATION);
        assert!(err.to_string().contains("a billing exists"));
    }

    #[test]
    fn duplicate_billing_is_a_conflict() {
        let err = describe_constraint(&ConstraintViolation::Unique {
            constraint: Some("billings_booking_id_key".to_string()),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), codes::business::DUPLICATE_RECORD);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn pool_timeout_is_service_unavailable() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn workflow_violations_are_conflicts() {
        let err: ApiError = BookingError::InvalidTransition {
            from: booking_service::BookingStatus::Cancelled,
            to: booking_service::BookingStatus::Confirmed,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = BookingError::Validation("origin is required".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn over_allocation_is_a_bad_request() {
        let err: ApiError = BillingError::OverAllocation {
            billing_id: Uuid::nil(),
            requested: dec!(100),
            outstanding: dec!(50),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unbalanced_voucher_is_a_bad_request() {
        let err: ApiError = AccountingError::Unbalanced {
            debit: dec!(10),
            credit: dec!(5),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), codes::validation::INVALID_INPUT);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let response = ApiError::internal("password column missing").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use error_common::YatraError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Allocation of {requested} to billing {billing_id} exceeds outstanding {outstanding}")]
    OverAllocation {
        billing_id: Uuid,
        requested: Decimal,
        outstanding: Decimal,
    },

    #[error("Billing is {0} and cannot be changed")]
    InvalidStatus(String),

    #[error("Unknown value: {0}")]
    UnknownValue(String),
}

impl From<BillingError> for YatraError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(_)
            | BillingError::UnknownValue(_)
            | BillingError::OverAllocation { .. } => YatraError::ValidationError(err.to_string()),
            BillingError::InvalidStatus(_) => YatraError::BusinessError(err.to_string()),
        }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;

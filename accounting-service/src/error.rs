use error_common::YatraError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Voucher is not balanced: debit {debit} vs credit {credit}")]
    Unbalanced { debit: Decimal, credit: Decimal },

    #[error("Ledger account error: {0}")]
    InvalidAccount(String),

    #[error("Unknown value: {0}")]
    UnknownValue(String),
}

impl From<AccountingError> for YatraError {
    fn from(err: AccountingError) -> Self {
        YatraError::ValidationError(err.to_string())
    }
}

pub type AccountingResult<T> = Result<T, AccountingError>;

use crate::models::BookingStatus;
use error_common::YatraError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking cannot be cancelled: {0}")]
    CancellationBlocked(String),

    #[error("Booking cannot be completed: {0}")]
    CompletionBlocked(String),

    #[error("Booking in status {0} can no longer be edited")]
    NotEditable(BookingStatus),

    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}

impl From<BookingError> for YatraError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) | BookingError::UnknownStatus(msg) => {
                YatraError::ValidationError(msg)
            }
            other => YatraError::BusinessError(other.to_string()),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

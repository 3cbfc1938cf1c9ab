use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{BookingError, BookingResult};
use crate::models::BookingStatus;

/// Workflow commands exposed on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Confirm,
    Cancel,
    Complete,
}

impl BookingAction {
    #[must_use]
    pub fn target(self) -> BookingStatus {
        match self {
            Self::Confirm => BookingStatus::Confirmed,
            Self::Cancel => BookingStatus::Cancelled,
            Self::Complete => BookingStatus::Completed,
        }
    }
}

/// Facts about related records that guard a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionGuards {
    /// A billing record exists for the booking (and is not cancelled)
    pub has_billing: bool,
    /// Money already applied to the booking's billing
    pub amount_received: Decimal,
}

impl BookingStatus {
    /// Edge check on the state graph, ignoring guards
    #[must_use]
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Draft, BookingStatus::Confirmed | BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled | BookingStatus::Completed)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Booking details and manifest may only change before confirmation
    #[must_use]
    pub fn is_editable(self) -> bool {
        self == BookingStatus::Draft
    }

    #[must_use]
    pub fn can_be_billed(self) -> bool {
        self == BookingStatus::Confirmed
    }
}

/// Resolve the status a booking moves to for an action
///
/// # Errors
/// `InvalidTransition` when the state graph has no such edge,
/// `CompletionBlocked` when completing an unbilled booking and
/// `CancellationBlocked` when money has been received.
pub fn apply_action(
    current: BookingStatus,
    action: BookingAction,
    guards: TransitionGuards,
) -> BookingResult<BookingStatus> {
    let next = action.target();
    if !current.can_transition_to(next) {
        return Err(BookingError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    match action {
        BookingAction::Complete if !guards.has_billing => Err(BookingError::CompletionBlocked(
            "generate a billing before completing the booking".to_string(),
        )),
        BookingAction::Cancel if guards.amount_received > Decimal::ZERO => {
            Err(BookingError::CancellationBlocked(format!(
                "{} has already been received against its billing",
                guards.amount_received
            )))
        }
        _ => Ok(next),
    }
}

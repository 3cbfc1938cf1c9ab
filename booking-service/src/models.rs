use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::BookingError;

/// Most passengers a single booking may carry
pub const MAX_PASSENGERS: usize = 9;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Draft,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Draft,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(BookingError::UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Passenger gender as recorded on the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" | "M" => Ok(Self::Male),
            "FEMALE" | "F" => Ok(Self::Female),
            "OTHER" | "O" => Ok(Self::Other),
            _ => Err(BookingError::Validation(format!("unknown gender: {s}"))),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Passenger details submitted with a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PassengerInput {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub berth_preference: Option<String>,
}

/// Booking details as entered by an agent or customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingDraft {
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub travel_class: String,
    pub quota: Option<String>,
    /// Falls back to the number of passengers when omitted
    pub passenger_count: Option<i32>,
    pub estimated_fare: Option<Decimal>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub passengers: Vec<PassengerInput>,
}

/// Partial update of a DRAFT booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingChanges {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub travel_class: Option<String>,
    pub quota: Option<String>,
    pub estimated_fare: Option<Decimal>,
    pub remarks: Option<String>,
    /// Replaces the whole manifest when present
    pub passengers: Option<Vec<PassengerInput>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("confirmed".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert_eq!(
            BookingStatus::try_from("DRAFT".to_string()),
            Ok(BookingStatus::Draft)
        );
        assert!("booked".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&BookingStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
    }

    #[test]
    fn gender_accepts_short_codes() {
        assert_eq!("f".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("MALE".parse::<Gender>(), Ok(Gender::Male));
        assert!("x".parse::<Gender>().is_err());
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{BookingError, BookingResult};
use crate::models::{BookingChanges, BookingDraft, PassengerInput, MAX_PASSENGERS};

const MAX_PLACE_LEN: usize = 100;
const MAX_CLASS_LEN: usize = 20;
const MAX_PASSENGER_AGE: i32 = 125;

/// Booking intake rules
pub struct BookingService;

impl BookingService {
    /// Create a new booking service
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a new booking and return its effective passenger count
    ///
    /// # Errors
    /// `Validation` describing the first rule the draft breaks.
    pub fn validate_draft(&self, draft: &BookingDraft, today: NaiveDate) -> BookingResult<i32> {
        validate_route(&draft.origin, &draft.destination)?;
        validate_travel_date(draft.travel_date, today)?;
        validate_class(&draft.travel_class)?;
        validate_fare(draft.estimated_fare)?;
        validate_passengers(&draft.passengers)?;

        let count = resolve_passenger_count(draft.passenger_count, &draft.passengers)?;
        debug!(
            origin = %draft.origin,
            destination = %draft.destination,
            passenger_count = count,
            "Booking draft validated"
        );
        Ok(count)
    }

    /// Validate edits against the stored booking values
    ///
    /// Returns the new passenger count when the manifest is replaced.
    ///
    /// # Errors
    /// `Validation` when the merged booking would be invalid.
    pub fn validate_changes(
        &self,
        changes: &BookingChanges,
        current_origin: &str,
        current_destination: &str,
        today: NaiveDate,
    ) -> BookingResult<Option<i32>> {
        let origin = changes.origin.as_deref().unwrap_or(current_origin);
        let destination = changes.destination.as_deref().unwrap_or(current_destination);
        validate_route(origin, destination)?;

        if let Some(date) = changes.travel_date {
            validate_travel_date(date, today)?;
        }
        if let Some(class) = &changes.travel_class {
            validate_class(class)?;
        }
        validate_fare(changes.estimated_fare)?;

        match &changes.passengers {
            Some(passengers) if passengers.is_empty() => Err(BookingError::Validation(
                "a booking needs at least one passenger".to_string(),
            )),
            Some(passengers) => {
                validate_passengers(passengers)?;
                resolve_passenger_count(None, passengers).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl Default for BookingService {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_route(origin: &str, destination: &str) -> BookingResult<()> {
    let origin = origin.trim();
    let destination = destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(BookingError::Validation(
            "origin and destination are required".to_string(),
        ));
    }
    if origin.len() > MAX_PLACE_LEN || destination.len() > MAX_PLACE_LEN {
        return Err(BookingError::Validation(format!(
            "origin and destination must be at most {MAX_PLACE_LEN} characters"
        )));
    }
    if origin.eq_ignore_ascii_case(destination) {
        return Err(BookingError::Validation(
            "origin and destination must differ".to_string(),
        ));
    }
    Ok(())
}

fn validate_travel_date(date: NaiveDate, today: NaiveDate) -> BookingResult<()> {
    if date < today {
        return Err(BookingError::Validation(format!(
            "travel date {date} is in the past"
        )));
    }
    Ok(())
}

fn validate_class(class: &str) -> BookingResult<()> {
    let class = class.trim();
    if class.is_empty() || class.len() > MAX_CLASS_LEN {
        return Err(BookingError::Validation(format!(
            "travel class must be 1 to {MAX_CLASS_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_fare(fare: Option<Decimal>) -> BookingResult<()> {
    match fare {
        Some(f) if f < Decimal::ZERO => Err(BookingError::Validation(
            "estimated fare cannot be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_passengers(passengers: &[PassengerInput]) -> BookingResult<()> {
    if passengers.len() > MAX_PASSENGERS {
        return Err(BookingError::Validation(format!(
            "a booking can carry at most {MAX_PASSENGERS} passengers"
        )));
    }
    for (idx, p) in passengers.iter().enumerate() {
        if p.name.trim().is_empty() {
            return Err(BookingError::Validation(format!(
                "passenger {} name is required",
                idx + 1
            )));
        }
        if !(0..=MAX_PASSENGER_AGE).contains(&p.age) {
            return Err(BookingError::Validation(format!(
                "passenger {} age must be between 0 and {MAX_PASSENGER_AGE}",
                idx + 1
            )));
        }
    }
    Ok(())
}

fn resolve_passenger_count(
    declared: Option<i32>,
    passengers: &[PassengerInput],
) -> BookingResult<i32> {
    let listed = i32::try_from(passengers.len())
        .map_err(|_| BookingError::Validation("too many passengers".to_string()))?;
    let count = match declared {
        Some(n) if !passengers.is_empty() && n != listed => {
            return Err(BookingError::Validation(format!(
                "passenger_count is {n} but {listed} passengers were listed"
            )));
        }
        Some(n) => n,
        None => listed,
    };
    let max = i32::try_from(MAX_PASSENGERS).unwrap_or(i32::MAX);
    if !(1..=max).contains(&count) {
        return Err(BookingError::Validation(format!(
            "passenger count must be between 1 and {max}"
        )));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn passenger(name: &str, age: i32) -> PassengerInput {
        PassengerInput {
            name: name.to_string(),
            age,
            gender: Gender::Female,
            berth_preference: None,
        }
    }

    fn draft() -> BookingDraft {
        BookingDraft {
            origin: "NDLS".to_string(),
            destination: "BCT".to_string(),
            travel_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            travel_class: "3A".to_string(),
            quota: None,
            passenger_count: None,
            estimated_fare: Some(dec!(2450.00)),
            remarks: None,
            passengers: vec![passenger("Asha", 34), passenger("Ravi", 36)],
        }
    }

    #[test]
    fn count_defaults_to_manifest_size() {
        assert_eq!(BookingService::new().validate_draft(&draft(), today()), Ok(2));
    }

    #[test]
    fn declared_count_without_manifest_is_accepted() {
        let mut d = draft();
        d.passengers.clear();
        d.passenger_count = Some(4);
        assert_eq!(BookingService::new().validate_draft(&d, today()), Ok(4));
    }

    #[test]
    fn mismatched_count_is_rejected() {
        let mut d = draft();
        d.passenger_count = Some(3);
        assert!(matches!(
            BookingService::new().validate_draft(&d, today()),
            Err(BookingError::Validation(msg)) if msg.contains("passenger_count")
        ));
    }

    #[test]
    fn empty_booking_is_rejected() {
        let mut d = draft();
        d.passengers.clear();
        assert!(BookingService::new().validate_draft(&d, today()).is_err());
    }

    #[test]
    fn same_origin_and_destination_is_rejected() {
        let mut d = draft();
        d.destination = "ndls".to_string();
        assert!(BookingService::new().validate_draft(&d, today()).is_err());
    }

    #[test]
    fn past_travel_date_is_rejected() {
        let mut d = draft();
        d.travel_date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(BookingService::new().validate_draft(&d, today()).is_err());
        d.travel_date = today();
        assert!(BookingService::new().validate_draft(&d, today()).is_ok());
    }

    #[test]
    fn too_many_passengers_is_rejected() {
        let mut d = draft();
        d.passengers = (0..10).map(|i| passenger(&format!("P{i}"), 30)).collect();
        assert!(BookingService::new().validate_draft(&d, today()).is_err());
    }

    #[test]
    fn negative_fare_is_rejected() {
        let mut d = draft();
        d.estimated_fare = Some(dec!(-1));
        assert!(BookingService::new().validate_draft(&d, today()).is_err());
    }

    #[test]
    fn changes_merge_with_current_route() {
        let svc = BookingService::new();
        let changes = BookingChanges {
            destination: Some("NDLS".to_string()),
            ..BookingChanges::default()
        };
        assert!(svc.validate_changes(&changes, "NDLS", "BCT", today()).is_err());

        let replace = BookingChanges {
            passengers: Some(vec![passenger("Asha", 34)]),
            ..BookingChanges::default()
        };
        assert_eq!(svc.validate_changes(&replace, "NDLS", "BCT", today()), Ok(Some(1)));
    }
}

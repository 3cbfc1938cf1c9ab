//! Request validation utilities for consistent validation across handlers
//!
//! This module provides a `RequestValidation` trait and helper macros to
//! centralize validation logic and ensure consistent error messages.

use crate::error::ApiError;

/// Trait for validating request payloads
///
/// Implement this trait for create/update request types. Handlers call
/// `validate()` before touching the database.
///
/// # Example
///
/// ```rust,ignore
/// impl RequestValidation for CreateCustomerRequest {
///     fn validate(&self) -> Result<(), ApiError> {
///         validate_required!(self.name, "Customer name is required");
///         if let Some(ref email) = self.email {
///             validate_email!(email, "Invalid email format");
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait RequestValidation {
    /// Validates the request and returns an error if validation fails
    ///
    /// # Errors
    /// `ApiError::Validation` describing the first failing rule.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-empty strings)
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating UUID fields (non-nil)
#[macro_export]
macro_rules! validate_uuid {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.is_nil(), $message);
    };
}

/// Macro for validating string length (in characters)
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.chars().count();
        $crate::validate_field!($field, len >= $min && len <= $max, $message);
    };
}

/// Macro for validating email format (basic check)
#[macro_export]
macro_rules! validate_email {
    ($field:expr, $message:expr) => {
        $crate::validate_field!(
            $field,
            $field.contains('@') && $field.contains('.'),
            $message
        );
    };
}

/// Macro for validating numeric ranges
#[macro_export]
macro_rules! validate_range {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        $crate::validate_field!($field, $field >= $min && $field <= $max, $message);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRequest {
        name: String,
        email: String,
        passengers: u32,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.name, "Name is required");
            validate_length!(self.name, 2, 100, "Name must be between 2 and 100 characters");
            validate_email!(self.email, "Invalid email format");
            validate_range!(self.passengers, 1, 9, "Passengers must be between 1 and 9");
            Ok(())
        }
    }

    fn request() -> TestRequest {
        TestRequest {
            name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            passengers: 2,
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_name() {
        let req = TestRequest {
            name: "  ".to_string(),
            ..request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_email() {
        let req = TestRequest {
            email: "asha-at-example".to_string(),
            ..request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validation_out_of_range() {
        let req = TestRequest {
            passengers: 12,
            ..request()
        };
        assert!(req.validate().is_err());
    }
}

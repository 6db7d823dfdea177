//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A currency amount was negative or not a number.
    #[error("amount must be non-negative, got {value}")]
    NegativeAmount { value: f64 },
}

/// Validates a currency amount (a budget or an expense).
///
/// Amounts must be finite and non-negative. NaN is rejected rather than
/// silently compared, since every budget check in this crate uses `>`.
pub fn validate_amount(value: f64) -> Result<f64, ValidationError> {
    if value.is_nan() || value < 0.0 {
        return Err(ValidationError::NegativeAmount { value });
    }
    Ok(value)
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated trip identifier.
    ///
    /// Trip IDs must be non-empty strings. They should be unique within the
    /// system, though uniqueness is enforced at the database level.
    TripId, "trip ID"
);

define_string_id!(
    /// A validated section identifier.
    ///
    /// Sections are the date-bounded sub-intervals of a trip (e.g., a city
    /// stay or a travel leg).
    SectionId, "section ID"
);

define_string_id!(
    /// A validated catalog activity identifier.
    ActivityId, "activity ID"
);

define_string_id!(
    /// A validated activity-instance identifier.
    ///
    /// An instance is a catalog activity scheduled on a specific date inside
    /// a specific section.
    InstanceId, "instance ID"
);

define_string_id!(
    /// A validated city identifier for the shared catalog.
    CityId, "city ID"
);

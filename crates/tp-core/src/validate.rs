//! Nested date-range containment checks.
//!
//! These run before every create/update of a section or activity instance.
//! Failures are ordinary user-input rejections carried in the `Err` variant,
//! never panics; the caller translates the kind into a user-facing message
//! and aborts the mutation with no partial state change.

use chrono::NaiveDate;
use thiserror::Error;

/// Business-rule violations for date containment.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoundsError {
    /// The end date precedes the start date.
    #[error("end date must not precede start date")]
    RangeOrderInvalid,

    /// A child range or date falls outside its required parent containment.
    #[error("dates must lie within the parent date range")]
    OutOfParentBounds,
}

/// Validates that a range is well-ordered (`start <= end`).
pub fn validate_range_order(start: NaiveDate, end: NaiveDate) -> Result<(), BoundsError> {
    if end < start {
        return Err(BoundsError::RangeOrderInvalid);
    }
    Ok(())
}

/// Validates that a section's range is well-ordered and nested within its
/// trip's range (inclusive bounds on both ends).
pub fn validate_section_within_trip(
    section_start: NaiveDate,
    section_end: NaiveDate,
    trip_start: NaiveDate,
    trip_end: NaiveDate,
) -> Result<(), BoundsError> {
    validate_range_order(section_start, section_end)?;
    if section_start < trip_start || section_end > trip_end {
        return Err(BoundsError::OutOfParentBounds);
    }
    Ok(())
}

/// Validates that an activity instance's scheduled date falls within its
/// section's range (inclusive bounds).
pub fn validate_instance_within_section(
    instance_date: NaiveDate,
    section_start: NaiveDate,
    section_end: NaiveDate,
) -> Result<(), BoundsError> {
    if instance_date < section_start || instance_date > section_end {
        return Err(BoundsError::OutOfParentBounds);
    }
    Ok(())
}

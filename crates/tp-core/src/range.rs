//! Closed date intervals and the pure predicates over them.
//!
//! All ranges are `[start, end]` with date-only granularity. Callers are
//! responsible for rejecting malformed ranges (`start > end`) through the
//! validators in [`crate::validate`]; the predicates here are total and never
//! fail.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A closed interval of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range. The `start <= end` invariant is enforced upstream.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// True iff `inner` lies entirely within `self` (inclusive bounds).
    #[must_use]
    pub fn contains(&self, inner: &Self) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }

    /// True iff `date` falls on a day of this range (inclusive bounds).
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Closed-interval intersection test.
    ///
    /// Two ranges touching at a single shared boundary day count as
    /// overlapping. This inclusive policy is deliberate and load-bearing for
    /// the overlap warnings.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    ///
    /// A single-day range counts 1, never 0.
    #[must_use]
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterates the days of the range in order, inclusive of both endpoints.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        (0..self.day_count()).map(move |offset| self.start + Duration::days(offset))
    }

    /// Translates the range so it starts at `anchor`, preserving duration.
    #[must_use]
    pub fn shift_to(&self, anchor: NaiveDate) -> Self {
        Self {
            start: anchor,
            end: anchor + (self.end - self.start),
        }
    }
}

//! Trip aggregate model types.
//!
//! A trip owns its sections; each section owns its scheduled activity
//! instances. Catalog activities and cities are shared, immutable reference
//! data from the scheduler's perspective.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::ActivityCategory;
use crate::range::DateRange;
use crate::types::{ActivityId, CityId, InstanceId, SectionId, TripId};

/// Lifecycle status of a trip relative to a reference date.
///
/// Always derived, never stored: a persisted status column goes stale the
/// moment the calendar moves past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TripStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl TripStatus {
    /// Derives the status of `range` as seen from `today`.
    #[must_use]
    pub fn derive(range: DateRange, today: NaiveDate) -> Self {
        if today < range.start {
            Self::Upcoming
        } else if today > range.end {
            Self::Completed
        } else {
            Self::Ongoing
        }
    }

    /// String representation for display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Ongoing => "ONGOING",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A planned journey: the root aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: TripId,

    /// The owning user.
    pub owner: String,

    pub name: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Total budget for the trip, split evenly across its days for reporting.
    #[serde(default)]
    pub budget: f64,

    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl Trip {
    /// The trip's date range.
    #[must_use]
    pub const fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Derived lifecycle status as seen from `today`.
    #[must_use]
    pub fn status(&self, today: NaiveDate) -> TripStatus {
        TripStatus::derive(self.range(), today)
    }
}

/// A date-bounded sub-interval of a trip grouping related activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub trip_id: TripId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default)]
    pub budget: f64,

    /// Derived from the section's activities; persisted with each mutation.
    pub category: ActivityCategory,

    /// True iff this section's range intersects a sibling's range.
    /// Derived; persisted with each mutation.
    #[serde(default)]
    pub has_overlap_warning: bool,

    /// Insertion/display order. Not used by any scheduling logic.
    #[serde(default)]
    pub order_index: i64,
}

impl Section {
    /// The section's date range.
    #[must_use]
    pub const fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// A catalog activity scheduled inside a section, joined with the catalog
/// fields the scheduling logic needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledActivity {
    pub id: InstanceId,
    pub section_id: SectionId,
    pub activity_id: ActivityId,

    pub scheduled_date: NaiveDate,

    /// Advisory time of day ("HH:MM"). Ignored by overlap and validation
    /// logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,

    /// Expense override. Zero means unset; the catalog base cost applies.
    #[serde(default)]
    pub expense: f64,

    /// Insertion/display order. Not used by any scheduling logic.
    #[serde(default)]
    pub order_index: i64,

    /// Base cost of the referenced catalog activity.
    pub catalog_cost: f64,

    /// Category of the referenced catalog activity.
    pub catalog_category: ActivityCategory,
}

impl ScheduledActivity {
    /// The expense this instance contributes to budget rollups: the override
    /// when set (> 0), else the catalog base cost.
    #[must_use]
    pub fn effective_expense(&self) -> f64 {
        if self.expense > 0.0 {
            self.expense
        } else {
            self.catalog_cost
        }
    }
}

/// A catalog entry describing a bookable or plannable thing to do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: ActivityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<CityId>,

    pub name: String,
    pub category: ActivityCategory,

    /// Base cost applied when an instance carries no expense override.
    #[serde(default)]
    pub cost: f64,

    /// Typical duration in minutes. Informational only.
    #[serde(default)]
    pub duration_minutes: i64,
}

/// A destination city in the shared catalog.
///
/// Uniqueness on (name, country) is enforced by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub country: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

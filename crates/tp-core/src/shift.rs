//! Duration-preserving date translation for trip duplication.
//!
//! When a shared trip is copied, its whole subtree moves to a new anchor
//! date. Every section and instance keeps its offset from the trip start and
//! its own duration, so the copied itinerary has exactly the original's
//! relative spacing.

use chrono::NaiveDate;

use crate::range::DateRange;
use crate::trip::{ScheduledActivity, Section, Trip};
use crate::types::{InstanceId, SectionId};

/// New dates for one section of a shifted trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedSection {
    pub id: SectionId,
    pub range: DateRange,
}

/// New date for one activity instance of a shifted trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedInstance {
    pub id: InstanceId,
    pub scheduled_date: NaiveDate,
}

/// The full translation plan for duplicating a trip at a new anchor date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripShift {
    pub trip: DateRange,
    pub sections: Vec<ShiftedSection>,
    pub instances: Vec<ShiftedInstance>,
}

/// Translates a range so it starts at `anchor`, preserving duration.
#[must_use]
pub fn shift_range(original: DateRange, anchor: NaiveDate) -> DateRange {
    original.shift_to(anchor)
}

/// Computes new dates for a trip and its entire subtree anchored at `anchor`.
///
/// Section and instance offsets are measured from the original trip start
/// and reapplied relative to the new start, so relative spacing survives the
/// translation bit for bit.
#[must_use]
pub fn shift_trip(
    trip: &Trip,
    sections: &[Section],
    activities: &[ScheduledActivity],
    anchor: NaiveDate,
) -> TripShift {
    let original_start = trip.start_date;
    let new_trip = shift_range(trip.range(), anchor);

    let shifted_sections = sections
        .iter()
        .map(|section| {
            let offset = section.start_date - original_start;
            ShiftedSection {
                id: section.id.clone(),
                range: section.range().shift_to(anchor + offset),
            }
        })
        .collect();

    let shifted_instances = activities
        .iter()
        .map(|activity| {
            let offset = activity.scheduled_date - original_start;
            ShiftedInstance {
                id: activity.id.clone(),
                scheduled_date: anchor + offset,
            }
        })
        .collect();

    TripShift {
        trip: new_trip,
        sections: shifted_sections,
        instances: shifted_instances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ActivityCategory;
    use crate::types::{ActivityId, TripId};
    use chrono::Utc;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).expect("valid test date")
    }

    fn trip(start: NaiveDate, end: NaiveDate) -> Trip {
        let now = Utc::now();
        Trip {
            id: TripId::new("trip-1").unwrap(),
            owner: "sam".to_string(),
            name: "Original".to_string(),
            start_date: start,
            end_date: end,
            budget: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn section(id: &str, start: NaiveDate, end: NaiveDate) -> Section {
        Section {
            id: SectionId::new(id).unwrap(),
            trip_id: TripId::new("trip-1").unwrap(),
            title: None,
            notes: None,
            start_date: start,
            end_date: end,
            budget: 0.0,
            category: ActivityCategory::Buffer,
            has_overlap_warning: false,
            order_index: 0,
        }
    }

    fn instance(id: &str, section_id: &str, date: NaiveDate) -> ScheduledActivity {
        ScheduledActivity {
            id: InstanceId::new(id).unwrap(),
            section_id: SectionId::new(section_id).unwrap(),
            activity_id: ActivityId::new("act-1").unwrap(),
            scheduled_date: date,
            scheduled_time: None,
            expense: 0.0,
            order_index: 0,
            catalog_cost: 0.0,
            catalog_category: ActivityCategory::Experience,
        }
    }

    #[test]
    fn shift_range_moves_start_to_anchor() {
        let shifted = shift_range(DateRange::new(d(1, 10), d(1, 15)), d(3, 1));
        assert_eq!(shifted, DateRange::new(d(3, 1), d(3, 6)));
    }

    #[test]
    fn offsets_and_durations_survive_translation() {
        // Trip Jan10-Jan15; section one day in with a 2-day duration; moved
        // to Mar1 the trip becomes Mar1-Mar6 and the section Mar2-Mar4.
        let t = trip(d(1, 10), d(1, 15));
        let sections = vec![section("s-1", d(1, 11), d(1, 13))];
        let instances = vec![instance("i-1", "s-1", d(1, 12))];

        let shift = shift_trip(&t, &sections, &instances, d(3, 1));

        assert_eq!(shift.trip, DateRange::new(d(3, 1), d(3, 6)));
        assert_eq!(shift.sections[0].range, DateRange::new(d(3, 2), d(3, 4)));
        assert_eq!(shift.instances[0].scheduled_date, d(3, 3));

        // Relative spacing is identical on both sides of the translation.
        let original_offset = sections[0].start_date - t.start_date;
        let new_offset = shift.sections[0].range.start - shift.trip.start;
        assert_eq!(original_offset, new_offset);
        assert_eq!(
            shift.sections[0].range.day_count(),
            sections[0].range().day_count()
        );
    }

    #[test]
    fn shift_backwards_in_time() {
        let t = trip(d(6, 10), d(6, 12));
        let sections = vec![section("s-1", d(6, 10), d(6, 11))];
        let shift = shift_trip(&t, &sections, &[], d(2, 1));

        assert_eq!(shift.trip, DateRange::new(d(2, 1), d(2, 3)));
        assert_eq!(shift.sections[0].range, DateRange::new(d(2, 1), d(2, 2)));
    }

    #[test]
    fn anchor_equal_to_original_start_is_identity() {
        let t = trip(d(1, 10), d(1, 15));
        let sections = vec![section("s-1", d(1, 11), d(1, 13))];
        let instances = vec![instance("i-1", "s-1", d(1, 14))];

        let shift = shift_trip(&t, &sections, &instances, d(1, 10));

        assert_eq!(shift.trip, t.range());
        assert_eq!(shift.sections[0].range, sections[0].range());
        assert_eq!(shift.instances[0].scheduled_date, d(1, 14));
    }

    #[test]
    fn every_section_and_instance_is_planned() {
        let t = trip(d(1, 1), d(1, 10));
        let sections = vec![
            section("s-1", d(1, 1), d(1, 3)),
            section("s-2", d(1, 4), d(1, 7)),
            section("s-3", d(1, 8), d(1, 10)),
        ];
        let instances = vec![
            instance("i-1", "s-1", d(1, 2)),
            instance("i-2", "s-2", d(1, 5)),
        ];

        let shift = shift_trip(&t, &sections, &instances, d(5, 1));
        assert_eq!(shift.sections.len(), 3);
        assert_eq!(shift.instances.len(), 2);
    }
}

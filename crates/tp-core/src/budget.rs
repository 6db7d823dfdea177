//! Budget and expense rollups.
//!
//! Read-only projections over a fully loaded trip aggregate. Nothing here is
//! persisted, in contrast to classification and overlap flags.
//!
//! Two different over-budget comparisons are in play and must stay distinct:
//! a day is over budget when its absolute total exceeds the trip's daily
//! budget, while a section is over budget when its *average* daily spend
//! exceeds the section's own daily budget.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::trip::{ScheduledActivity, Section, Trip};
use crate::types::SectionId;

/// Expense rollup for one calendar day of the trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBudget {
    pub date: NaiveDate,
    pub total_expense: f64,
    pub daily_budget: f64,
    pub is_over_budget: bool,
}

/// Expense rollup for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionBudget {
    pub section_id: SectionId,
    pub total_expense: f64,
    pub budget: f64,
    pub daily_budget: f64,
    pub days: i64,
    pub is_over_budget: bool,
}

/// Full budget report for a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripBudgetReport {
    pub trip_total: f64,
    pub trip_budget: f64,
    pub avg_per_day: f64,
    pub days: i64,
    pub per_day: Vec<DayBudget>,
    pub per_section: Vec<SectionBudget>,
}

/// Spreads an amount evenly across a day count, guarding the degenerate case.
///
/// A valid single-day range counts one day, so zero can only arrive through
/// a violated precondition; returning zero keeps the projection total.
#[allow(clippy::cast_precision_loss)]
fn amount_per_day(amount: f64, days: i64) -> f64 {
    if days <= 0 {
        return 0.0;
    }
    amount / days as f64
}

/// Computes per-day, per-section, and trip-level expense totals.
///
/// `activities` must carry every instance of every section in `sections`;
/// effective expense is the instance override when set, else the catalog
/// base cost.
#[must_use]
pub fn compute_budget(
    trip: &Trip,
    sections: &[Section],
    activities: &[ScheduledActivity],
) -> TripBudgetReport {
    let trip_range = trip.range();
    let days = trip_range.day_count();
    let trip_daily_budget = amount_per_day(trip.budget, days);

    // One pass over the instances feeds both groupings.
    let mut day_expenses: HashMap<NaiveDate, f64> = HashMap::new();
    let mut section_expenses: HashMap<SectionId, f64> = HashMap::new();
    for activity in activities {
        let expense = activity.effective_expense();
        *day_expenses.entry(activity.scheduled_date).or_insert(0.0) += expense;
        *section_expenses
            .entry(activity.section_id.clone())
            .or_insert(0.0) += expense;
    }

    let per_day: Vec<DayBudget> = trip_range
        .days()
        .map(|date| {
            let total_expense = day_expenses.get(&date).copied().unwrap_or(0.0);
            DayBudget {
                date,
                total_expense,
                daily_budget: trip_daily_budget,
                is_over_budget: total_expense > trip_daily_budget,
            }
        })
        .collect();

    let per_section: Vec<SectionBudget> = sections
        .iter()
        .map(|section| {
            let section_days = section.range().day_count();
            let section_daily_budget = amount_per_day(section.budget, section_days);
            let total_expense = section_expenses.get(&section.id).copied().unwrap_or(0.0);
            // Average daily spend, not absolute total: the section check has
            // a different comparison basis than the per-day trip check.
            let avg_daily_expense = amount_per_day(total_expense, section_days);
            SectionBudget {
                section_id: section.id.clone(),
                total_expense,
                budget: section.budget,
                daily_budget: section_daily_budget,
                days: section_days,
                is_over_budget: avg_daily_expense > section_daily_budget,
            }
        })
        .collect();

    let trip_total: f64 = per_day.iter().map(|day| day.total_expense).sum();
    let avg_per_day = amount_per_day(trip_total, days);

    TripBudgetReport {
        trip_total,
        trip_budget: trip.budget,
        avg_per_day,
        days,
        per_day,
        per_section,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ActivityCategory;
    use crate::types::{ActivityId, InstanceId, TripId};
    use chrono::Utc;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).expect("valid test date")
    }

    fn trip(start: NaiveDate, end: NaiveDate, budget: f64) -> Trip {
        let now = Utc::now();
        Trip {
            id: TripId::new("trip-1").unwrap(),
            owner: "sam".to_string(),
            name: "Test Trip".to_string(),
            start_date: start,
            end_date: end,
            budget,
            created_at: now,
            updated_at: now,
        }
    }

    fn section(id: &str, start: NaiveDate, end: NaiveDate, budget: f64) -> Section {
        Section {
            id: SectionId::new(id).unwrap(),
            trip_id: TripId::new("trip-1").unwrap(),
            title: None,
            notes: None,
            start_date: start,
            end_date: end,
            budget,
            category: ActivityCategory::Buffer,
            has_overlap_warning: false,
            order_index: 0,
        }
    }

    fn instance(
        id: &str,
        section_id: &str,
        date: NaiveDate,
        expense: f64,
        catalog_cost: f64,
    ) -> ScheduledActivity {
        ScheduledActivity {
            id: InstanceId::new(id).unwrap(),
            section_id: SectionId::new(section_id).unwrap(),
            activity_id: ActivityId::new("act-1").unwrap(),
            scheduled_date: date,
            scheduled_time: None,
            expense,
            order_index: 0,
            catalog_cost,
            catalog_category: ActivityCategory::Experience,
        }
    }

    #[test]
    fn seven_day_trip_daily_budget() {
        // 700 over 7 days: 100/day. A 150 day is flagged, a 0 day is not.
        let t = trip(d(1, 1), d(1, 7), 700.0);
        let s = section("s-1", d(1, 1), d(1, 7), 0.0);
        let instances = vec![instance("i-1", "s-1", d(1, 2), 150.0, 0.0)];

        let report = compute_budget(&t, &[s], &instances);

        assert_eq!(report.days, 7);
        assert!((report.per_day[0].daily_budget - 100.0).abs() < f64::EPSILON);

        let jan2 = &report.per_day[1];
        assert_eq!(jan2.date, d(1, 2));
        assert!((jan2.total_expense - 150.0).abs() < f64::EPSILON);
        assert!(jan2.is_over_budget);

        let jan1 = &report.per_day[0];
        assert!((jan1.total_expense).abs() < f64::EPSILON);
        assert!(!jan1.is_over_budget);
    }

    #[test]
    fn day_exactly_on_budget_is_not_flagged() {
        let t = trip(d(1, 1), d(1, 7), 700.0);
        let s = section("s-1", d(1, 1), d(1, 7), 0.0);
        let instances = vec![instance("i-1", "s-1", d(1, 3), 100.0, 0.0)];

        let report = compute_budget(&t, &[s], &instances);
        assert!(!report.per_day[2].is_over_budget);
    }

    #[test]
    fn expenses_accumulate_per_day_across_sections() {
        let t = trip(d(1, 1), d(1, 4), 400.0);
        let sections = vec![
            section("s-1", d(1, 1), d(1, 2), 0.0),
            section("s-2", d(1, 2), d(1, 4), 0.0),
        ];
        let instances = vec![
            instance("i-1", "s-1", d(1, 2), 60.0, 0.0),
            instance("i-2", "s-2", d(1, 2), 70.0, 0.0),
        ];

        let report = compute_budget(&t, &sections, &instances);
        let jan2 = &report.per_day[1];
        assert!((jan2.total_expense - 130.0).abs() < f64::EPSILON);
        assert!(jan2.is_over_budget);
    }

    #[test]
    fn catalog_cost_applies_when_override_unset() {
        let t = trip(d(1, 1), d(1, 2), 100.0);
        let s = section("s-1", d(1, 1), d(1, 2), 0.0);
        let instances = vec![instance("i-1", "s-1", d(1, 1), 0.0, 35.0)];

        let report = compute_budget(&t, &[s], &instances);
        assert!((report.per_day[0].total_expense - 35.0).abs() < f64::EPSILON);
        assert!((report.trip_total - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn section_over_budget_uses_average_daily_spend() {
        // Section: 4 days, budget 200 -> 50/day. Total spend 240 -> 60/day
        // average, over budget even though no single check compares totals.
        let t = trip(d(1, 1), d(1, 10), 0.0);
        let s = section("s-1", d(1, 1), d(1, 4), 200.0);
        let instances = vec![
            instance("i-1", "s-1", d(1, 1), 120.0, 0.0),
            instance("i-2", "s-1", d(1, 3), 120.0, 0.0),
        ];

        let report = compute_budget(&t, &[s], &instances);
        let sb = &report.per_section[0];
        assert_eq!(sb.days, 4);
        assert!((sb.daily_budget - 50.0).abs() < f64::EPSILON);
        assert!((sb.total_expense - 240.0).abs() < f64::EPSILON);
        assert!(sb.is_over_budget);
    }

    #[test]
    fn dual_bases_diverge_on_the_same_data() {
        // Trip: 2 days, budget 100 -> 50/day. Section: 2 days, budget 100.
        // One 80-spend day: the day is over (80 > 50) but the section is not
        // (average 40 <= 50). Both verdicts are intentional.
        let t = trip(d(1, 1), d(1, 2), 100.0);
        let s = section("s-1", d(1, 1), d(1, 2), 100.0);
        let instances = vec![instance("i-1", "s-1", d(1, 1), 80.0, 0.0)];

        let report = compute_budget(&t, &[s], &instances);
        assert!(report.per_day[0].is_over_budget);
        assert!(!report.per_section[0].is_over_budget);
    }

    #[test]
    fn single_day_trip_counts_one_day() {
        let t = trip(d(1, 5), d(1, 5), 50.0);
        let s = section("s-1", d(1, 5), d(1, 5), 50.0);
        let instances = vec![instance("i-1", "s-1", d(1, 5), 75.0, 0.0)];

        let report = compute_budget(&t, &[s], &instances);
        assert_eq!(report.days, 1);
        assert!((report.per_day[0].daily_budget - 50.0).abs() < f64::EPSILON);
        assert!(report.per_day[0].is_over_budget);
        assert!((report.avg_per_day - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trip_total_and_average() {
        let t = trip(d(1, 1), d(1, 5), 500.0);
        let s = section("s-1", d(1, 1), d(1, 5), 0.0);
        let instances = vec![
            instance("i-1", "s-1", d(1, 1), 100.0, 0.0),
            instance("i-2", "s-1", d(1, 3), 50.0, 0.0),
        ];

        let report = compute_budget(&t, &[s], &instances);
        assert!((report.trip_total - 150.0).abs() < f64::EPSILON);
        assert!((report.avg_per_day - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_trip_reports_zeroes() {
        let t = trip(d(1, 1), d(1, 3), 300.0);
        let report = compute_budget(&t, &[], &[]);

        assert_eq!(report.days, 3);
        assert!((report.trip_total).abs() < f64::EPSILON);
        assert!((report.avg_per_day).abs() < f64::EPSILON);
        assert_eq!(report.per_day.len(), 3);
        assert!(report.per_day.iter().all(|day| !day.is_over_budget));
        assert!(report.per_section.is_empty());
    }

    #[test]
    fn zero_budget_trip_flags_any_spend() {
        let t = trip(d(1, 1), d(1, 2), 0.0);
        let s = section("s-1", d(1, 1), d(1, 2), 0.0);
        let instances = vec![instance("i-1", "s-1", d(1, 1), 10.0, 0.0)];

        let report = compute_budget(&t, &[s], &instances);
        assert!(report.per_day[0].is_over_budget);
    }
}

//! Report command: per-day, per-section, and trip-level budget rollups.

use std::collections::HashMap;
use std::fmt::Write;

use anyhow::Result;
use tp_core::{SectionId, TripBudgetReport, TripId};
use tp_db::{Database, TripData};

use super::catalog::truncate_chars;

/// Format a budget report as pretty-printed JSON.
pub fn format_report_json(report: &TripBudgetReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Format a budget report for human-readable output.
pub fn format_report(data: &TripData, report: &TripBudgetReport) -> String {
    let mut output = String::new();
    let trip = &data.trip;

    writeln!(output, "BUDGET {}", trip.name).unwrap();
    writeln!(
        output,
        "{} to {}  ({} days)",
        trip.start_date, trip.end_date, report.days
    )
    .unwrap();
    writeln!(output).unwrap();

    writeln!(output, "{:<10}  {:>9}  {:>9}", "Date", "Spent", "Budget").unwrap();
    writeln!(output, "──────────  ─────────  ─────────").unwrap();
    for day in &report.per_day {
        let marker = if day.is_over_budget { "  OVER" } else { "" };
        writeln!(
            output,
            "{:<10}  {:>9.2}  {:>9.2}{}",
            day.date, day.total_expense, day.daily_budget, marker
        )
        .unwrap();
    }

    if !report.per_section.is_empty() {
        let titles: HashMap<&SectionId, &str> = data
            .sections
            .iter()
            .map(|section| (&section.id, section.title.as_deref().unwrap_or("(untitled)")))
            .collect();

        writeln!(output).unwrap();
        writeln!(
            output,
            "{:<22}  {:>4}  {:>9}  {:>9}",
            "Section", "Days", "Spent", "Budget"
        )
        .unwrap();
        writeln!(output, "──────────────────────  ────  ─────────  ─────────").unwrap();
        for section in &report.per_section {
            let title = titles.get(&section.section_id).copied().unwrap_or("?");
            let marker = if section.is_over_budget { "  OVER" } else { "" };
            writeln!(
                output,
                "{:<22}  {:>4}  {:>9.2}  {:>9.2}{}",
                truncate_chars(title, 22),
                section.days,
                section.total_expense,
                section.budget,
                marker
            )
            .unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {:.2}   Budget: {:.2}   Avg/day: {:.2}",
        report.trip_total, report.trip_budget, report.avg_per_day
    )
    .unwrap();

    output
}

/// Runs the report command.
pub fn run(db: &Database, trip: &str, json: bool) -> Result<()> {
    let trip_id = TripId::new(trip.to_string())?;
    let report = db.budget_report(&trip_id)?;

    if json {
        println!("{}", format_report_json(&report)?);
    } else {
        let data = db.load_trip(&trip_id)?;
        print!("{}", format_report(&data, &report));
    }

    Ok(())
}

//! Trip commands: create, list, show, update, delete, copy.

use std::fmt::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tp_core::{TripId, TripStatus};
use tp_db::{Database, NewTrip, TripData, TripPatch};

use super::catalog::truncate_chars;
use crate::{Config, StatusFilter, TripAction};

const fn status_of(filter: StatusFilter) -> TripStatus {
    match filter {
        StatusFilter::Upcoming => TripStatus::Upcoming,
        StatusFilter::Ongoing => TripStatus::Ongoing,
        StatusFilter::Completed => TripStatus::Completed,
    }
}

/// Trip data for display, with the status derived at render time.
#[derive(Debug, Clone, Serialize)]
pub struct TripEntry {
    pub id: String,
    pub id_short: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    pub status: TripStatus,
}

/// Loads trips for display, deriving status from `today` and applying the
/// optional status filter.
pub fn get_trips_for_display(
    db: &Database,
    filter: Option<StatusFilter>,
    today: NaiveDate,
) -> Result<Vec<TripEntry>> {
    let entries = db
        .list_trips()?
        .into_iter()
        .map(|trip| {
            let id_short: String = trip.id.as_str().chars().take(6).collect();
            TripEntry {
                id: trip.id.to_string(),
                id_short,
                name: trip.name.clone(),
                start_date: trip.start_date,
                end_date: trip.end_date,
                budget: trip.budget,
                status: trip.status(today),
            }
        })
        .filter(|entry| filter.is_none_or(|f| entry.status == status_of(f)))
        .collect();
    Ok(entries)
}

/// Format trips for human-readable output.
pub fn format_trips(entries: &[TripEntry]) -> String {
    let mut output = String::new();

    writeln!(output, "TRIPS").unwrap();
    writeln!(output).unwrap();

    if entries.is_empty() {
        writeln!(output, "No trips.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'tp trip create' to plan one.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<7}  {:<22}  {:<10}  {:<10}  {:>10}  {:<9}",
        "ID", "Name", "Start", "End", "Budget", "Status"
    )
    .unwrap();
    writeln!(
        output,
        "───────  ──────────────────────  ──────────  ──────────  ──────────  ─────────"
    )
    .unwrap();

    for entry in entries {
        writeln!(
            output,
            "{:<7}  {:<22}  {:<10}  {:<10}  {:>10.2}  {:<9}",
            entry.id_short,
            truncate_chars(&entry.name, 22),
            entry.start_date,
            entry.end_date,
            entry.budget,
            entry.status.as_str(),
        )
        .unwrap();
    }

    output
}

/// Format a trip's full subtree for human-readable output.
pub fn format_trip(data: &TripData, today: NaiveDate) -> String {
    let mut output = String::new();
    let trip = &data.trip;

    writeln!(output, "TRIP {}  ({})", trip.name, trip.id).unwrap();
    writeln!(
        output,
        "{} to {}  {}  budget {:.2}",
        trip.start_date,
        trip.end_date,
        trip.status(today).as_str(),
        trip.budget
    )
    .unwrap();

    if data.sections.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No sections.").unwrap();
        return output;
    }

    for section in &data.sections {
        writeln!(output).unwrap();
        let title = section.title.as_deref().unwrap_or("(untitled)");
        let warning = if section.has_overlap_warning {
            "  ! overlaps"
        } else {
            ""
        };
        writeln!(
            output,
            "[{}] {}  {} to {}  {}  budget {:.2}{}",
            section.id.as_str().chars().take(6).collect::<String>(),
            title,
            section.start_date,
            section.end_date,
            section.category.as_str(),
            section.budget,
            warning,
        )
        .unwrap();

        for activity in data
            .activities
            .iter()
            .filter(|activity| activity.section_id == section.id)
        {
            let time = activity.scheduled_time.as_deref().unwrap_or("--:--");
            writeln!(
                output,
                "    {}  {}  [{}] expense {:.2}",
                activity.scheduled_date,
                time,
                activity.id.as_str().chars().take(6).collect::<String>(),
                activity.effective_expense(),
            )
            .unwrap();
        }
    }

    output
}

/// Runs a trip subcommand.
pub fn run(db: &mut Database, config: &Config, action: &TripAction) -> Result<()> {
    match action {
        TripAction::Create {
            name,
            start,
            end,
            budget,
            owner,
        } => {
            let trip = db.create_trip(&NewTrip {
                owner: owner.clone().unwrap_or_else(|| config.owner.clone()),
                name: name.clone(),
                start_date: *start,
                end_date: *end,
                budget: *budget,
            })?;
            println!("{}", trip.id);
        }
        TripAction::List { status, json } => {
            let today = Local::now().date_naive();
            let entries = get_trips_for_display(db, *status, today)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", format_trips(&entries));
            }
        }
        TripAction::Show { trip, json } => {
            let trip_id = TripId::new(trip.clone())?;
            let data = db.load_trip(&trip_id)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let today = Local::now().date_naive();
                print!("{}", format_trip(&data, today));
            }
        }
        TripAction::Update {
            trip,
            name,
            start,
            end,
            budget,
        } => {
            let trip_id = TripId::new(trip.clone())?;
            let updated = db.update_trip(
                &trip_id,
                &TripPatch {
                    name: name.clone(),
                    start_date: *start,
                    end_date: *end,
                    budget: *budget,
                },
            )?;
            println!("Updated trip {}.", updated.id);
        }
        TripAction::Delete { trip } => {
            let trip_id = TripId::new(trip.clone())?;
            db.delete_trip(&trip_id)?;
            println!("Deleted trip {trip_id}.");
        }
        TripAction::Copy { trip, anchor, name } => {
            let trip_id = TripId::new(trip.clone())?;
            let anchor = anchor.unwrap_or_else(|| Local::now().date_naive());
            let copy = db.duplicate_trip(&trip_id, anchor, name.as_deref())?;
            println!("{}", copy.id);
        }
    }
    Ok(())
}

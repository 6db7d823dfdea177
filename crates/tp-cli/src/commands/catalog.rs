//! Catalog commands: seeding and listing the shared city/activity catalog.

use std::collections::HashSet;
use std::fmt::Write;

use anyhow::Result;
use tp_core::{Activity, ActivityCategory};
use tp_db::{Database, NewActivity};

use crate::CatalogAction;

struct CitySeed {
    name: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
}

struct ActivitySeed {
    name: &'static str,
    category: ActivityCategory,
    cost: f64,
    duration_minutes: i64,
}

const CITIES: &[CitySeed] = &[
    CitySeed { name: "Paris", country: "France", latitude: 48.8566, longitude: 2.3522 },
    CitySeed { name: "London", country: "United Kingdom", latitude: 51.5074, longitude: -0.1278 },
    CitySeed { name: "Rome", country: "Italy", latitude: 41.9028, longitude: 12.4964 },
    CitySeed { name: "Barcelona", country: "Spain", latitude: 41.3851, longitude: 2.1734 },
    CitySeed { name: "Tokyo", country: "Japan", latitude: 35.6762, longitude: 139.6503 },
    CitySeed { name: "Bangkok", country: "Thailand", latitude: 13.7563, longitude: 100.5018 },
    CitySeed { name: "New York", country: "USA", latitude: 40.7128, longitude: -74.0060 },
    CitySeed { name: "Sydney", country: "Australia", latitude: -33.8688, longitude: 151.2093 },
];

const ACTIVITIES: &[ActivitySeed] = &[
    ActivitySeed { name: "Airport Transfer", category: ActivityCategory::Travel, cost: 25.0, duration_minutes: 60 },
    ActivitySeed { name: "Train Journey", category: ActivityCategory::Travel, cost: 50.0, duration_minutes: 120 },
    ActivitySeed { name: "Metro Pass", category: ActivityCategory::Travel, cost: 10.0, duration_minutes: 1440 },
    ActivitySeed { name: "Car Rental", category: ActivityCategory::Travel, cost: 80.0, duration_minutes: 1440 },
    ActivitySeed { name: "Hotel Stay", category: ActivityCategory::Stay, cost: 150.0, duration_minutes: 1440 },
    ActivitySeed { name: "Hostel Stay", category: ActivityCategory::Stay, cost: 40.0, duration_minutes: 1440 },
    ActivitySeed { name: "Resort Stay", category: ActivityCategory::Stay, cost: 300.0, duration_minutes: 1440 },
    ActivitySeed { name: "Museum Visit", category: ActivityCategory::Experience, cost: 20.0, duration_minutes: 180 },
    ActivitySeed { name: "City Walking Tour", category: ActivityCategory::Experience, cost: 30.0, duration_minutes: 180 },
    ActivitySeed { name: "Food Tour", category: ActivityCategory::Experience, cost: 60.0, duration_minutes: 240 },
    ActivitySeed { name: "Boat Tour", category: ActivityCategory::Experience, cost: 60.0, duration_minutes: 150 },
    ActivitySeed { name: "Beach Day", category: ActivityCategory::Experience, cost: 20.0, duration_minutes: 360 },
    ActivitySeed { name: "Free Day", category: ActivityCategory::Buffer, cost: 0.0, duration_minutes: 1440 },
    ActivitySeed { name: "Travel Rest", category: ActivityCategory::Buffer, cost: 0.0, duration_minutes: 720 },
];

/// Runs a catalog subcommand.
pub fn run(db: &mut Database, action: &CatalogAction) -> Result<()> {
    match action {
        CatalogAction::Seed => seed(db),
        CatalogAction::List { category, json } => list(db, *category, *json),
    }
}

/// Loads the built-in starter catalog.
///
/// Cities upsert on (name, country), and activities are matched by name, so
/// repeated runs never duplicate catalog rows.
pub fn seed(db: &mut Database) -> Result<()> {
    for city in CITIES {
        db.upsert_city(
            city.name,
            city.country,
            Some(city.latitude),
            Some(city.longitude),
        )?;
    }

    let existing: HashSet<String> = db
        .list_activities(None)?
        .into_iter()
        .map(|activity| activity.name)
        .collect();

    let mut inserted = 0;
    for activity in ACTIVITIES {
        if existing.contains(activity.name) {
            continue;
        }
        db.insert_activity(&NewActivity {
            city_id: None,
            name: activity.name.to_string(),
            category: activity.category,
            cost: activity.cost,
            duration_minutes: activity.duration_minutes,
        })?;
        inserted += 1;
    }

    println!("Seeded {} cities, {} new activities.", CITIES.len(), inserted);
    Ok(())
}

/// Format catalog activities for human-readable output.
pub fn format_activities(activities: &[Activity]) -> String {
    let mut output = String::new();

    writeln!(output, "CATALOG ACTIVITIES").unwrap();
    writeln!(output).unwrap();

    if activities.is_empty() {
        writeln!(output, "No catalog activities.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'tp catalog seed' to load the starter catalog.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<7}  {:<24}  {:<10}  {:>8}  {:>8}",
        "ID", "Name", "Category", "Cost", "Minutes"
    )
    .unwrap();
    writeln!(
        output,
        "───────  ────────────────────────  ──────────  ────────  ────────"
    )
    .unwrap();

    for activity in activities {
        let id_short: String = activity.id.as_str().chars().take(6).collect();
        writeln!(
            output,
            "{:<7}  {:<24}  {:<10}  {:>8.2}  {:>8}",
            id_short,
            truncate_chars(&activity.name, 24),
            activity.category.as_str(),
            activity.cost,
            activity.duration_minutes,
        )
        .unwrap();
    }

    output
}

/// Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8.
pub(crate) fn truncate_chars(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        format!("{}...", name.chars().take(max - 3).collect::<String>())
    } else {
        name.to_string()
    }
}

fn list(db: &Database, category: Option<ActivityCategory>, json: bool) -> Result<()> {
    let activities = db.list_activities(category)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&activities)?);
    } else {
        print!("{}", format_activities(&activities));
    }
    Ok(())
}

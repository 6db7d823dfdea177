//! Section commands: add, update, remove.

use anyhow::Result;
use tp_core::{SectionId, TripId};
use tp_db::{Database, NewSection, SectionPatch};

use crate::SectionAction;

/// Runs a section subcommand.
pub fn run(db: &mut Database, action: &SectionAction) -> Result<()> {
    match action {
        SectionAction::Add {
            trip,
            title,
            notes,
            start,
            end,
            budget,
            order,
        } => {
            let trip_id = TripId::new(trip.clone())?;
            let section = db.create_section(
                &trip_id,
                &NewSection {
                    title: title.clone(),
                    notes: notes.clone(),
                    start_date: *start,
                    end_date: *end,
                    budget: *budget,
                    order_index: *order,
                },
            )?;
            if section.has_overlap_warning {
                eprintln!("warning: section dates overlap another section in this trip");
            }
            println!("{}", section.id);
        }
        SectionAction::Update {
            section,
            title,
            notes,
            start,
            end,
            budget,
            order,
        } => {
            let section_id = SectionId::new(section.clone())?;
            let updated = db.update_section(
                &section_id,
                &SectionPatch {
                    title: title.clone(),
                    notes: notes.clone(),
                    start_date: *start,
                    end_date: *end,
                    budget: *budget,
                    order_index: *order,
                },
            )?;
            if updated.has_overlap_warning {
                eprintln!("warning: section dates overlap another section in this trip");
            }
            println!("Updated section {}.", updated.id);
        }
        SectionAction::Remove { section } => {
            let section_id = SectionId::new(section.clone())?;
            db.delete_section(&section_id)?;
            println!("Removed section {section_id}.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tp_db::NewTrip;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn add_then_remove_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let trip = db
            .create_trip(&NewTrip {
                owner: "sam".to_string(),
                name: "Trip".to_string(),
                start_date: d(6, 1),
                end_date: d(6, 30),
                budget: 0.0,
            })
            .unwrap();

        let add = SectionAction::Add {
            trip: trip.id.to_string(),
            title: Some("Paris".to_string()),
            notes: None,
            start: d(6, 2),
            end: d(6, 6),
            budget: 100.0,
            order: 0,
        };
        run(&mut db, &add).unwrap();

        let data = db.load_trip(&trip.id).unwrap();
        assert_eq!(data.sections.len(), 1);
        assert_eq!(data.sections[0].title.as_deref(), Some("Paris"));

        let remove = SectionAction::Remove {
            section: data.sections[0].id.to_string(),
        };
        run(&mut db, &remove).unwrap();
        assert!(db.load_trip(&trip.id).unwrap().sections.is_empty());
    }

    #[test]
    fn out_of_bounds_add_surfaces_the_error_kind() {
        let mut db = Database::open_in_memory().unwrap();
        let trip = db
            .create_trip(&NewTrip {
                owner: "sam".to_string(),
                name: "Trip".to_string(),
                start_date: d(6, 10),
                end_date: d(6, 20),
                budget: 0.0,
            })
            .unwrap();

        let add = SectionAction::Add {
            trip: trip.id.to_string(),
            title: None,
            notes: None,
            start: d(6, 5),
            end: d(6, 12),
            budget: 0.0,
            order: 0,
        };
        let err = run(&mut db, &add).unwrap_err();
        assert!(err.to_string().contains("parent date range"));
    }
}

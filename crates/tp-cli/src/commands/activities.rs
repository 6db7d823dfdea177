//! Scheduled-activity commands: schedule, update, remove.

use anyhow::Result;
use tp_core::{ActivityId, InstanceId, SectionId};
use tp_db::{Database, InstancePatch, NewScheduledActivity};

use crate::ActivityAction;

/// Runs a scheduled-activity subcommand.
pub fn run(db: &mut Database, action: &ActivityAction) -> Result<()> {
    match action {
        ActivityAction::Schedule {
            section,
            activity,
            date,
            time,
            expense,
            order,
        } => {
            let section_id = SectionId::new(section.clone())?;
            let activity_id = ActivityId::new(activity.clone())?;
            let instance = db.schedule_activity(
                &section_id,
                &NewScheduledActivity {
                    activity_id,
                    scheduled_date: *date,
                    scheduled_time: time.clone(),
                    expense: *expense,
                    order_index: *order,
                },
            )?;
            println!("{}", instance.id);
        }
        ActivityAction::Update {
            instance,
            date,
            time,
            expense,
            order,
        } => {
            let instance_id = InstanceId::new(instance.clone())?;
            let updated = db.update_scheduled_activity(
                &instance_id,
                &InstancePatch {
                    scheduled_date: *date,
                    scheduled_time: time.clone(),
                    expense: *expense,
                    order_index: *order,
                },
            )?;
            println!("Updated scheduled activity {}.", updated.id);
        }
        ActivityAction::Remove { instance } => {
            let instance_id = InstanceId::new(instance.clone())?;
            db.remove_scheduled_activity(&instance_id)?;
            println!("Removed scheduled activity {instance_id}.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tp_core::ActivityCategory;
    use tp_db::{NewActivity, NewSection, NewTrip};

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn fixture(db: &mut Database) -> (SectionId, ActivityId) {
        let trip = db
            .create_trip(&NewTrip {
                owner: "sam".to_string(),
                name: "Trip".to_string(),
                start_date: d(6, 1),
                end_date: d(6, 30),
                budget: 0.0,
            })
            .unwrap();
        let section = db
            .create_section(
                &trip.id,
                &NewSection {
                    title: None,
                    notes: None,
                    start_date: d(6, 2),
                    end_date: d(6, 8),
                    budget: 0.0,
                    order_index: 0,
                },
            )
            .unwrap();
        let activity = db
            .insert_activity(&NewActivity {
                city_id: None,
                name: "Museum Visit".to_string(),
                category: ActivityCategory::Experience,
                cost: 20.0,
                duration_minutes: 180,
            })
            .unwrap();
        (section.id, activity.id)
    }

    #[test]
    fn schedule_updates_section_category() {
        let mut db = Database::open_in_memory().unwrap();
        let (section_id, activity_id) = fixture(&mut db);

        let schedule = ActivityAction::Schedule {
            section: section_id.to_string(),
            activity: activity_id.to_string(),
            date: d(6, 3),
            time: Some("14:00".to_string()),
            expense: 0.0,
            order: 0,
        };
        run(&mut db, &schedule).unwrap();

        let section = db
            .load_trip(&db.list_trips().unwrap()[0].id)
            .unwrap()
            .sections
            .remove(0);
        assert_eq!(section.category, ActivityCategory::Experience);
    }

    #[test]
    fn date_outside_section_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let (section_id, activity_id) = fixture(&mut db);

        let schedule = ActivityAction::Schedule {
            section: section_id.to_string(),
            activity: activity_id.to_string(),
            date: d(6, 9),
            time: None,
            expense: 0.0,
            order: 0,
        };
        let err = run(&mut db, &schedule).unwrap_err();
        assert!(err.to_string().contains("parent date range"));
    }
}

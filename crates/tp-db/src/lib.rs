//! Storage layer for the trip planner.
//!
//! Provides persistence for trips, sections, scheduled activities, and the
//! shared city/activity catalog using `rusqlite`, and owns the per-trip
//! mutation orchestration: every write loads the affected trip's subtree,
//! runs the validators, recomputes derived state (section categories and
//! overlap flags) through `tp-core`, and commits everything in one
//! transaction. Either the edit and its derived recomputation land together
//! or neither does.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization. Trips are
//! independently owned aggregates; callers that want concurrent writers must
//! serialize writes per trip themselves.
//!
//! # Schema
//!
//! Dates are stored as TEXT in ISO 8601 format (`2025-06-10`), timestamps
//! with an RFC 3339 time component. Lexicographic ordering matches
//! chronological ordering in both cases.
//!
//! Referential integrity is enforced by the schema itself: deleting a trip
//! cascades to its sections and their scheduled activities, and the city
//! catalog is unique on (name, country). Orphaned child rows are
//! unrepresentable, so no after-the-fact cleanup pass exists.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use tp_core::{
    Activity, ActivityCategory, ActivityId, BoundsError, City, CityId, InstanceId,
    ScheduledActivity, Section, SectionId, Trip, TripBudgetReport, TripId, ValidationError,
    compute_budget, recompute_sections, shift_trip, types::validate_amount,
    validate_instance_within_section, validate_range_order, validate_section_within_trip,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No trip with the given ID.
    #[error("trip not found: {0}")]
    TripNotFound(String),

    /// No section with the given ID.
    #[error("section not found: {0}")]
    SectionNotFound(String),

    /// No catalog activity with the given ID.
    #[error("activity not found: {0}")]
    ActivityNotFound(String),

    /// No scheduled activity with the given ID.
    #[error("scheduled activity not found: {0}")]
    InstanceNotFound(String),

    /// A date containment rule was violated; the mutation was rejected.
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// A field value failed validation; the mutation was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failed to parse a stored date.
    #[error("invalid date for {row_id}: {value}")]
    DateParse {
        row_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A stored category string is not a known category.
    #[error("invalid category for {row_id}: {value}")]
    CategoryParse { row_id: String, value: String },
}

/// A trip's fully loaded subtree: the aggregate every mutation and report
/// operates on.
#[derive(Debug, Clone, Serialize)]
pub struct TripData {
    pub trip: Trip,
    /// Sections in display order.
    pub sections: Vec<Section>,
    /// All scheduled activities of all sections, joined with catalog fields.
    pub activities: Vec<ScheduledActivity>,
}

/// Fields for creating a trip.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub owner: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
}

/// Partial update for a trip. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TripPatch {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
}

/// Fields for creating a section.
#[derive(Debug, Clone)]
pub struct NewSection {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    pub order_index: i64,
}

/// Partial update for a section. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub order_index: Option<i64>,
}

/// Fields for scheduling a catalog activity inside a section.
#[derive(Debug, Clone)]
pub struct NewScheduledActivity {
    pub activity_id: ActivityId,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: Option<String>,
    /// Expense override; zero means the catalog base cost applies.
    pub expense: f64,
    pub order_index: i64,
}

/// Partial update for a scheduled activity. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct InstancePatch {
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub expense: Option<f64>,
    pub order_index: Option<i64>,
}

/// Fields for adding a catalog activity.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub city_id: Option<CityId>,
    pub name: String,
    pub category: ActivityCategory,
    pub cost: f64,
    pub duration_minutes: i64,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                UNIQUE (name, country)
            );

            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                city_id TEXT REFERENCES cities(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                cost REAL NOT NULL DEFAULT 0,
                duration_minutes INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_activities_city ON activities(city_id);
            CREATE INDEX IF NOT EXISTS idx_activities_category ON activities(category);

            CREATE TABLE IF NOT EXISTS trips (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                budget REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_trips_owner ON trips(owner);

            -- Sections: date-bounded sub-intervals of a trip.
            -- category and has_overlap_warning are derived; they are
            -- rewritten by the recompute pass inside every mutation.
            CREATE TABLE IF NOT EXISTS trip_sections (
                id TEXT PRIMARY KEY,
                trip_id TEXT NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
                title TEXT,
                notes TEXT,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                budget REAL NOT NULL DEFAULT 0,
                category TEXT NOT NULL DEFAULT 'BUFFER',
                has_overlap_warning INTEGER NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_sections_trip ON trip_sections(trip_id);

            CREATE TABLE IF NOT EXISTS section_activities (
                id TEXT PRIMARY KEY,
                section_id TEXT NOT NULL REFERENCES trip_sections(id) ON DELETE CASCADE,
                activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
                scheduled_date TEXT NOT NULL,
                scheduled_time TEXT,
                expense REAL NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_section_activities_section
                ON section_activities(section_id);
            CREATE INDEX IF NOT EXISTS idx_section_activities_date
                ON section_activities(scheduled_date);
            ",
        )?;
        Ok(())
    }

    // ========== Catalog ==========

    /// Inserts a city or refreshes its coordinates if (name, country) exists.
    ///
    /// The existing row keeps its identity, so repeated seeding never
    /// duplicates a city.
    pub fn upsert_city(
        &mut self,
        name: &str,
        country: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<City, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO cities (id, name, country, latitude, longitude)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name, country) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude
            ",
            params![Uuid::new_v4().to_string(), name, country, latitude, longitude],
        )?;
        let city = tx.query_row(
            "SELECT id, name, country, latitude, longitude FROM cities
             WHERE name = ? AND country = ?",
            params![name, country],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            },
        )?;
        tx.commit()?;
        Ok(City {
            id: CityId::new(city.0)?,
            name: city.1,
            country: city.2,
            latitude: city.3,
            longitude: city.4,
        })
    }

    /// Lists all catalog cities ordered by name.
    pub fn list_cities(&self) -> Result<Vec<City>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, country, latitude, longitude FROM cities
             ORDER BY name ASC, country ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
            ))
        })?;
        let mut cities = Vec::new();
        for row in rows {
            let (id, name, country, latitude, longitude) = row?;
            cities.push(City {
                id: CityId::new(id)?,
                name,
                country,
                latitude,
                longitude,
            });
        }
        Ok(cities)
    }

    /// Adds a catalog activity.
    pub fn insert_activity(&mut self, new: &NewActivity) -> Result<Activity, DbError> {
        validate_amount(new.cost)?;
        let activity = Activity {
            id: ActivityId::new(Uuid::new_v4().to_string())?,
            city_id: new.city_id.clone(),
            name: new.name.clone(),
            category: new.category,
            cost: new.cost,
            duration_minutes: new.duration_minutes,
        };
        self.conn.execute(
            "
            INSERT INTO activities (id, city_id, name, category, cost, duration_minutes)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                activity.id.as_str(),
                activity.city_id.as_ref().map(CityId::as_str),
                activity.name,
                activity.category.as_str(),
                activity.cost,
                activity.duration_minutes,
            ],
        )?;
        Ok(activity)
    }

    /// Fetches one catalog activity.
    pub fn get_activity(&self, id: &ActivityId) -> Result<Activity, DbError> {
        query_activity(&self.conn, id)
    }

    /// Lists catalog activities, optionally filtered by category, ordered by
    /// name.
    pub fn list_activities(
        &self,
        category: Option<ActivityCategory>,
    ) -> Result<Vec<Activity>, DbError> {
        let (sql, filter) = match category {
            Some(cat) => (
                "SELECT id, city_id, name, category, cost, duration_minutes
                 FROM activities WHERE category = ? ORDER BY name ASC",
                Some(cat.as_str()),
            ),
            None => (
                "SELECT id, city_id, name, category, cost, duration_minutes
                 FROM activities ORDER BY name ASC",
                None,
            ),
        };
        let mut stmt = self.conn.prepare(sql)?;
        let collect = |mut rows: rusqlite::Rows<'_>| -> Result<Vec<Activity>, DbError> {
            let mut activities = Vec::new();
            while let Some(row) = rows.next()? {
                activities.push(activity_from_row(
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                )?);
            }
            Ok(activities)
        };
        match filter {
            Some(cat) => collect(stmt.query(params![cat])?),
            None => collect(stmt.query([])?),
        }
    }

    // ========== Trips ==========

    /// Creates a trip after validating its budget and date order.
    pub fn create_trip(&mut self, new: &NewTrip) -> Result<Trip, DbError> {
        validate_amount(new.budget)?;
        validate_range_order(new.start_date, new.end_date)?;

        let now = Utc::now();
        let trip = Trip {
            id: TripId::new(Uuid::new_v4().to_string())?,
            owner: new.owner.clone(),
            name: new.name.clone(),
            start_date: new.start_date,
            end_date: new.end_date,
            budget: new.budget,
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "
            INSERT INTO trips (id, owner, name, start_date, end_date, budget, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                trip.id.as_str(),
                trip.owner,
                trip.name,
                format_date(trip.start_date),
                format_date(trip.end_date),
                trip.budget,
                format_timestamp(trip.created_at),
                format_timestamp(trip.updated_at),
            ],
        )?;
        tracing::debug!(trip_id = %trip.id, "created trip");
        Ok(trip)
    }

    /// Fetches one trip.
    pub fn get_trip(&self, id: &TripId) -> Result<Trip, DbError> {
        query_trip(&self.conn, id)
    }

    /// Lists all trips, most recently created first.
    pub fn list_trips(&self) -> Result<Vec<Trip>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, owner, name, start_date, end_date, budget, created_at, updated_at
            FROM trips
            ORDER BY created_at DESC, id ASC
            ",
        )?;
        let mut rows = stmt.query([])?;
        let mut trips = Vec::new();
        while let Some(row) = rows.next()? {
            trips.push(trip_from_row(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            )?);
        }
        Ok(trips)
    }

    /// Applies a partial update to a trip.
    ///
    /// Revalidates date order, and containment of every existing section:
    /// shrinking a trip's range out from under its sections is rejected with
    /// `OutOfParentBounds` rather than leaving the subtree inconsistent.
    pub fn update_trip(&mut self, id: &TripId, patch: &TripPatch) -> Result<Trip, DbError> {
        let tx = self.conn.transaction()?;
        let mut trip = query_trip(&tx, id)?;

        if let Some(name) = &patch.name {
            trip.name.clone_from(name);
        }
        if let Some(start) = patch.start_date {
            trip.start_date = start;
        }
        if let Some(end) = patch.end_date {
            trip.end_date = end;
        }
        if let Some(budget) = patch.budget {
            trip.budget = validate_amount(budget)?;
        }
        validate_range_order(trip.start_date, trip.end_date)?;

        let sections = query_sections(&tx, id)?;
        for section in &sections {
            validate_section_within_trip(
                section.start_date,
                section.end_date,
                trip.start_date,
                trip.end_date,
            )?;
        }

        trip.updated_at = Utc::now();
        tx.execute(
            "UPDATE trips SET name = ?, start_date = ?, end_date = ?, budget = ?, updated_at = ?
             WHERE id = ?",
            params![
                trip.name,
                format_date(trip.start_date),
                format_date(trip.end_date),
                trip.budget,
                format_timestamp(trip.updated_at),
                trip.id.as_str(),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(trip_id = %trip.id, "updated trip");
        Ok(trip)
    }

    /// Deletes a trip and, by cascade, its sections and their scheduled
    /// activities.
    pub fn delete_trip(&mut self, id: &TripId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM trips WHERE id = ?", params![id.as_str()])?;
        if deleted == 0 {
            return Err(DbError::TripNotFound(id.to_string()));
        }
        tracing::debug!(trip_id = %id, "deleted trip");
        Ok(())
    }

    /// Loads a trip's full subtree.
    pub fn load_trip(&self, id: &TripId) -> Result<TripData, DbError> {
        let trip = query_trip(&self.conn, id)?;
        let sections = query_sections(&self.conn, id)?;
        let activities = query_trip_activities(&self.conn, id)?;
        Ok(TripData {
            trip,
            sections,
            activities,
        })
    }

    // ========== Sections ==========

    /// Creates a section inside a trip.
    ///
    /// Validates containment against the trip's range, then recomputes
    /// category and overlap flags for the whole section set in the same
    /// transaction. The returned section carries the fresh derived values.
    pub fn create_section(
        &mut self,
        trip_id: &TripId,
        new: &NewSection,
    ) -> Result<Section, DbError> {
        validate_amount(new.budget)?;
        let tx = self.conn.transaction()?;
        let trip = query_trip(&tx, trip_id)?;
        validate_section_within_trip(
            new.start_date,
            new.end_date,
            trip.start_date,
            trip.end_date,
        )?;

        let mut section = Section {
            id: SectionId::new(Uuid::new_v4().to_string())?,
            trip_id: trip_id.clone(),
            title: new.title.clone(),
            notes: new.notes.clone(),
            start_date: new.start_date,
            end_date: new.end_date,
            budget: new.budget,
            category: ActivityCategory::Buffer,
            has_overlap_warning: false,
            order_index: new.order_index,
        };
        tx.execute(
            "
            INSERT INTO trip_sections
            (id, trip_id, title, notes, start_date, end_date, budget, category,
             has_overlap_warning, order_index)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                section.id.as_str(),
                trip_id.as_str(),
                section.title,
                section.notes,
                format_date(section.start_date),
                format_date(section.end_date),
                section.budget,
                section.category.as_str(),
                section.has_overlap_warning,
                section.order_index,
            ],
        )?;

        let derived = refresh_derived(&tx, trip_id)?;
        touch_trip(&tx, trip_id)?;
        tx.commit()?;

        if let Some(fresh) = derived.get(&section.id) {
            section.category = fresh.category;
            section.has_overlap_warning = fresh.has_overlap_warning;
        }
        tracing::debug!(section_id = %section.id, trip_id = %trip_id, "created section");
        Ok(section)
    }

    /// Applies a partial update to a section.
    ///
    /// Validates the new range against the trip and against the section's
    /// own scheduled activities (shrinking a section out from under an
    /// instance is rejected), then recomputes derived state for the trip.
    pub fn update_section(
        &mut self,
        section_id: &SectionId,
        patch: &SectionPatch,
    ) -> Result<Section, DbError> {
        let tx = self.conn.transaction()?;
        let mut section = query_section(&tx, section_id)?;
        let trip = query_trip(&tx, &section.trip_id)?;

        if let Some(title) = &patch.title {
            section.title = Some(title.clone());
        }
        if let Some(notes) = &patch.notes {
            section.notes = Some(notes.clone());
        }
        if let Some(start) = patch.start_date {
            section.start_date = start;
        }
        if let Some(end) = patch.end_date {
            section.end_date = end;
        }
        if let Some(budget) = patch.budget {
            section.budget = validate_amount(budget)?;
        }
        if let Some(order_index) = patch.order_index {
            section.order_index = order_index;
        }

        validate_section_within_trip(
            section.start_date,
            section.end_date,
            trip.start_date,
            trip.end_date,
        )?;
        for instance in query_section_activities(&tx, section_id)? {
            validate_instance_within_section(
                instance.scheduled_date,
                section.start_date,
                section.end_date,
            )?;
        }

        tx.execute(
            "
            UPDATE trip_sections
            SET title = ?, notes = ?, start_date = ?, end_date = ?, budget = ?, order_index = ?
            WHERE id = ?
            ",
            params![
                section.title,
                section.notes,
                format_date(section.start_date),
                format_date(section.end_date),
                section.budget,
                section.order_index,
                section.id.as_str(),
            ],
        )?;

        let derived = refresh_derived(&tx, &section.trip_id)?;
        touch_trip(&tx, &section.trip_id)?;
        tx.commit()?;

        if let Some(fresh) = derived.get(&section.id) {
            section.category = fresh.category;
            section.has_overlap_warning = fresh.has_overlap_warning;
        }
        tracing::debug!(section_id = %section.id, "updated section");
        Ok(section)
    }

    /// Deletes a section and its scheduled activities, then refreshes the
    /// remaining sections' derived state.
    pub fn delete_section(&mut self, section_id: &SectionId) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let section = query_section(&tx, section_id)?;
        tx.execute(
            "DELETE FROM trip_sections WHERE id = ?",
            params![section_id.as_str()],
        )?;
        refresh_derived(&tx, &section.trip_id)?;
        touch_trip(&tx, &section.trip_id)?;
        tx.commit()?;
        tracing::debug!(section_id = %section_id, "deleted section");
        Ok(())
    }

    // ========== Scheduled activities ==========

    /// Schedules a catalog activity inside a section.
    ///
    /// The scheduled date must fall within the section's range. The owning
    /// section's category is recomputed in the same transaction.
    pub fn schedule_activity(
        &mut self,
        section_id: &SectionId,
        new: &NewScheduledActivity,
    ) -> Result<ScheduledActivity, DbError> {
        validate_amount(new.expense)?;
        let tx = self.conn.transaction()?;
        let section = query_section(&tx, section_id)?;
        let activity = query_activity(&tx, &new.activity_id)?;
        validate_instance_within_section(
            new.scheduled_date,
            section.start_date,
            section.end_date,
        )?;

        let instance = ScheduledActivity {
            id: InstanceId::new(Uuid::new_v4().to_string())?,
            section_id: section_id.clone(),
            activity_id: activity.id.clone(),
            scheduled_date: new.scheduled_date,
            scheduled_time: new.scheduled_time.clone(),
            expense: new.expense,
            order_index: new.order_index,
            catalog_cost: activity.cost,
            catalog_category: activity.category,
        };
        tx.execute(
            "
            INSERT INTO section_activities
            (id, section_id, activity_id, scheduled_date, scheduled_time, expense, order_index)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                instance.id.as_str(),
                section_id.as_str(),
                instance.activity_id.as_str(),
                format_date(instance.scheduled_date),
                instance.scheduled_time,
                instance.expense,
                instance.order_index,
            ],
        )?;

        refresh_derived(&tx, &section.trip_id)?;
        touch_trip(&tx, &section.trip_id)?;
        tx.commit()?;
        tracing::debug!(instance_id = %instance.id, section_id = %section_id, "scheduled activity");
        Ok(instance)
    }

    /// Applies a partial update to a scheduled activity.
    pub fn update_scheduled_activity(
        &mut self,
        instance_id: &InstanceId,
        patch: &InstancePatch,
    ) -> Result<ScheduledActivity, DbError> {
        let tx = self.conn.transaction()?;
        let mut instance = query_instance(&tx, instance_id)?;
        let section = query_section(&tx, &instance.section_id)?;

        if let Some(date) = patch.scheduled_date {
            instance.scheduled_date = date;
        }
        if let Some(time) = &patch.scheduled_time {
            instance.scheduled_time = Some(time.clone());
        }
        if let Some(expense) = patch.expense {
            instance.expense = validate_amount(expense)?;
        }
        if let Some(order_index) = patch.order_index {
            instance.order_index = order_index;
        }

        validate_instance_within_section(
            instance.scheduled_date,
            section.start_date,
            section.end_date,
        )?;

        tx.execute(
            "
            UPDATE section_activities
            SET scheduled_date = ?, scheduled_time = ?, expense = ?, order_index = ?
            WHERE id = ?
            ",
            params![
                format_date(instance.scheduled_date),
                instance.scheduled_time,
                instance.expense,
                instance.order_index,
                instance.id.as_str(),
            ],
        )?;

        refresh_derived(&tx, &section.trip_id)?;
        touch_trip(&tx, &section.trip_id)?;
        tx.commit()?;
        tracing::debug!(instance_id = %instance.id, "updated scheduled activity");
        Ok(instance)
    }

    /// Removes a scheduled activity and recomputes the owning section's
    /// category.
    pub fn remove_scheduled_activity(&mut self, instance_id: &InstanceId) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let instance = query_instance(&tx, instance_id)?;
        let section = query_section(&tx, &instance.section_id)?;
        tx.execute(
            "DELETE FROM section_activities WHERE id = ?",
            params![instance_id.as_str()],
        )?;
        refresh_derived(&tx, &section.trip_id)?;
        touch_trip(&tx, &section.trip_id)?;
        tx.commit()?;
        tracing::debug!(instance_id = %instance_id, "removed scheduled activity");
        Ok(())
    }

    // ========== Reporting & duplication ==========

    /// Computes the budget report for a trip. Read-only.
    pub fn budget_report(&self, trip_id: &TripId) -> Result<TripBudgetReport, DbError> {
        let data = self.load_trip(trip_id)?;
        Ok(compute_budget(&data.trip, &data.sections, &data.activities))
    }

    /// Duplicates a trip with its whole subtree anchored at `anchor`.
    ///
    /// Relative offsets from the trip start and all durations are preserved;
    /// derived fields, budgets, titles, ordering, and expense overrides are
    /// carried over verbatim. The copy is named after the original with a
    /// " (Copy)" suffix unless `name` is given.
    pub fn duplicate_trip(
        &mut self,
        trip_id: &TripId,
        anchor: NaiveDate,
        name: Option<&str>,
    ) -> Result<Trip, DbError> {
        let tx = self.conn.transaction()?;
        let trip = query_trip(&tx, trip_id)?;
        let sections = query_sections(&tx, trip_id)?;
        let activities = query_trip_activities(&tx, trip_id)?;

        let shift = shift_trip(&trip, &sections, &activities, anchor);

        let now = Utc::now();
        let copy = Trip {
            id: TripId::new(Uuid::new_v4().to_string())?,
            owner: trip.owner.clone(),
            name: name.map_or_else(|| format!("{} (Copy)", trip.name), str::to_string),
            start_date: shift.trip.start,
            end_date: shift.trip.end,
            budget: trip.budget,
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "
            INSERT INTO trips (id, owner, name, start_date, end_date, budget, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                copy.id.as_str(),
                copy.owner,
                copy.name,
                format_date(copy.start_date),
                format_date(copy.end_date),
                copy.budget,
                format_timestamp(copy.created_at),
                format_timestamp(copy.updated_at),
            ],
        )?;

        // shift_trip plans in input order, so the plans zip exactly.
        let mut new_section_ids: HashMap<SectionId, SectionId> = HashMap::new();
        for (section, shifted) in sections.iter().zip(&shift.sections) {
            let new_id = SectionId::new(Uuid::new_v4().to_string())?;
            tx.execute(
                "
                INSERT INTO trip_sections
                (id, trip_id, title, notes, start_date, end_date, budget, category,
                 has_overlap_warning, order_index)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    new_id.as_str(),
                    copy.id.as_str(),
                    section.title,
                    section.notes,
                    format_date(shifted.range.start),
                    format_date(shifted.range.end),
                    section.budget,
                    section.category.as_str(),
                    section.has_overlap_warning,
                    section.order_index,
                ],
            )?;
            new_section_ids.insert(section.id.clone(), new_id);
        }

        for (activity, shifted) in activities.iter().zip(&shift.instances) {
            let Some(new_section_id) = new_section_ids.get(&activity.section_id) else {
                continue;
            };
            tx.execute(
                "
                INSERT INTO section_activities
                (id, section_id, activity_id, scheduled_date, scheduled_time, expense, order_index)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    Uuid::new_v4().to_string(),
                    new_section_id.as_str(),
                    activity.activity_id.as_str(),
                    format_date(shifted.scheduled_date),
                    activity.scheduled_time,
                    activity.expense,
                    activity.order_index,
                ],
            )?;
        }

        tx.commit()?;
        tracing::debug!(original = %trip_id, copy = %copy.id, "duplicated trip");
        Ok(copy)
    }
}

// ========== Row decoding ==========

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// AutoSi keeps every subsecond digit, so a stored timestamp reads back
// exactly equal to the value that was written.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_date(row_id: &str, value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| DbError::DateParse {
        row_id: row_id.to_string(),
        value: value.to_string(),
        source,
    })
}

fn parse_timestamp(row_id: &str, value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| DbError::DateParse {
            row_id: row_id.to_string(),
            value: value.to_string(),
            source,
        })
}

fn parse_category(row_id: &str, value: &str) -> Result<ActivityCategory, DbError> {
    value.parse().map_err(|_| DbError::CategoryParse {
        row_id: row_id.to_string(),
        value: value.to_string(),
    })
}

#[allow(clippy::too_many_arguments)]
fn trip_from_row(
    id: String,
    owner: String,
    name: String,
    start_date: String,
    end_date: String,
    budget: f64,
    created_at: String,
    updated_at: String,
) -> Result<Trip, DbError> {
    Ok(Trip {
        start_date: parse_date(&id, &start_date)?,
        end_date: parse_date(&id, &end_date)?,
        created_at: parse_timestamp(&id, &created_at)?,
        updated_at: parse_timestamp(&id, &updated_at)?,
        id: TripId::new(id)?,
        owner,
        name,
        budget,
    })
}

#[allow(clippy::too_many_arguments)]
fn section_from_row(
    id: String,
    trip_id: String,
    title: Option<String>,
    notes: Option<String>,
    start_date: String,
    end_date: String,
    budget: f64,
    category: String,
    has_overlap_warning: bool,
    order_index: i64,
) -> Result<Section, DbError> {
    Ok(Section {
        start_date: parse_date(&id, &start_date)?,
        end_date: parse_date(&id, &end_date)?,
        category: parse_category(&id, &category)?,
        id: SectionId::new(id)?,
        trip_id: TripId::new(trip_id)?,
        title,
        notes,
        budget,
        has_overlap_warning,
        order_index,
    })
}

#[allow(clippy::too_many_arguments)]
fn instance_from_row(
    id: String,
    section_id: String,
    activity_id: String,
    scheduled_date: String,
    scheduled_time: Option<String>,
    expense: f64,
    order_index: i64,
    catalog_cost: f64,
    catalog_category: String,
) -> Result<ScheduledActivity, DbError> {
    Ok(ScheduledActivity {
        scheduled_date: parse_date(&id, &scheduled_date)?,
        catalog_category: parse_category(&id, &catalog_category)?,
        id: InstanceId::new(id)?,
        section_id: SectionId::new(section_id)?,
        activity_id: ActivityId::new(activity_id)?,
        scheduled_time,
        expense,
        order_index,
        catalog_cost,
    })
}

fn activity_from_row(
    id: String,
    city_id: Option<String>,
    name: String,
    category: String,
    cost: f64,
    duration_minutes: i64,
) -> Result<Activity, DbError> {
    Ok(Activity {
        category: parse_category(&id, &category)?,
        id: ActivityId::new(id)?,
        city_id: city_id.map(CityId::new).transpose()?,
        name,
        cost,
        duration_minutes,
    })
}

// ========== Aggregate queries ==========
//
// These run both on plain connections and inside transactions
// (`Transaction` derefs to `Connection`).

fn query_trip(conn: &Connection, id: &TripId) -> Result<Trip, DbError> {
    let row = conn
        .query_row(
            "
            SELECT id, owner, name, start_date, end_date, budget, created_at, updated_at
            FROM trips WHERE id = ?
            ",
            params![id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| DbError::TripNotFound(id.to_string()))?;
    trip_from_row(
        row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7,
    )
}

fn query_sections(conn: &Connection, trip_id: &TripId) -> Result<Vec<Section>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, trip_id, title, notes, start_date, end_date, budget, category,
               has_overlap_warning, order_index
        FROM trip_sections
        WHERE trip_id = ?
        ORDER BY order_index ASC, id ASC
        ",
    )?;
    let mut rows = stmt.query(params![trip_id.as_str()])?;
    let mut sections = Vec::new();
    while let Some(row) = rows.next()? {
        sections.push(section_from_row(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, f64>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, bool>(8)?,
            row.get::<_, i64>(9)?,
        )?);
    }
    Ok(sections)
}

fn query_section(conn: &Connection, id: &SectionId) -> Result<Section, DbError> {
    let row = conn
        .query_row(
            "
            SELECT id, trip_id, title, notes, start_date, end_date, budget, category,
                   has_overlap_warning, order_index
            FROM trip_sections WHERE id = ?
            ",
            params![id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, bool>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| DbError::SectionNotFound(id.to_string()))?;
    section_from_row(
        row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8, row.9,
    )
}

const INSTANCE_SELECT: &str = "
    SELECT sa.id, sa.section_id, sa.activity_id, sa.scheduled_date, sa.scheduled_time,
           sa.expense, sa.order_index, a.cost, a.category
    FROM section_activities sa
    JOIN activities a ON a.id = sa.activity_id
";

fn query_trip_activities(
    conn: &Connection,
    trip_id: &TripId,
) -> Result<Vec<ScheduledActivity>, DbError> {
    let sql = format!(
        "{INSTANCE_SELECT}
         JOIN trip_sections s ON s.id = sa.section_id
         WHERE s.trip_id = ?
         ORDER BY sa.order_index ASC, sa.id ASC"
    );
    collect_instances(conn, &sql, trip_id.as_str())
}

fn query_section_activities(
    conn: &Connection,
    section_id: &SectionId,
) -> Result<Vec<ScheduledActivity>, DbError> {
    let sql = format!(
        "{INSTANCE_SELECT}
         WHERE sa.section_id = ?
         ORDER BY sa.order_index ASC, sa.id ASC"
    );
    collect_instances(conn, &sql, section_id.as_str())
}

fn collect_instances(
    conn: &Connection,
    sql: &str,
    key: &str,
) -> Result<Vec<ScheduledActivity>, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![key])?;
    let mut instances = Vec::new();
    while let Some(row) = rows.next()? {
        instances.push(instance_from_row(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, f64>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, f64>(7)?,
            row.get::<_, String>(8)?,
        )?);
    }
    Ok(instances)
}

fn query_instance(conn: &Connection, id: &InstanceId) -> Result<ScheduledActivity, DbError> {
    let sql = format!("{INSTANCE_SELECT} WHERE sa.id = ?");
    collect_instances(conn, &sql, id.as_str())?
        .into_iter()
        .next()
        .ok_or_else(|| DbError::InstanceNotFound(id.to_string()))
}

fn query_activity(conn: &Connection, id: &ActivityId) -> Result<Activity, DbError> {
    let row = conn
        .query_row(
            "SELECT id, city_id, name, category, cost, duration_minutes
             FROM activities WHERE id = ?",
            params![id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| DbError::ActivityNotFound(id.to_string()))?;
    activity_from_row(row.0, row.1, row.2, row.3, row.4, row.5)
}

/// Recomputes and persists derived section state for one trip.
///
/// Runs inside the caller's transaction so the derived fields commit with
/// the triggering edit.
fn refresh_derived(
    conn: &Connection,
    trip_id: &TripId,
) -> Result<HashMap<SectionId, tp_core::DerivedSection>, DbError> {
    let sections = query_sections(conn, trip_id)?;
    let activities = query_trip_activities(conn, trip_id)?;
    let derived = recompute_sections(&sections, &activities);

    let mut stmt = conn.prepare(
        "UPDATE trip_sections SET category = ?, has_overlap_warning = ? WHERE id = ?",
    )?;
    for (section_id, state) in &derived {
        stmt.execute(params![
            state.category.as_str(),
            state.has_overlap_warning,
            section_id.as_str(),
        ])?;
    }
    Ok(derived)
}

fn touch_trip(conn: &Connection, trip_id: &TripId) -> Result<(), DbError> {
    conn.execute(
        "UPDATE trips SET updated_at = ? WHERE id = ?",
        params![format_timestamp(Utc::now()), trip_id.as_str()],
    )?;
    Ok(())
}

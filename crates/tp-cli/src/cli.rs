//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tp_core::ActivityCategory;

/// Trip planner.
///
/// Assembles trips from date-bounded sections of scheduled activities, keeps
/// the itinerary consistent (containment checks, overlap warnings, derived
/// section categories), and reports budgets.
#[derive(Debug, Parser)]
#[command(name = "tp", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the shared city/activity catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Manage trips.
    Trip {
        #[command(subcommand)]
        action: TripAction,
    },

    /// Manage a trip's sections.
    Section {
        #[command(subcommand)]
        action: SectionAction,
    },

    /// Schedule catalog activities inside sections.
    Activity {
        #[command(subcommand)]
        action: ActivityAction,
    },

    /// Show the budget report for a trip.
    Report {
        /// The trip ID.
        trip: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Derived trip status filter for `tp trip list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Upcoming,
    Ongoing,
    Completed,
}

/// Catalog subcommands.
#[derive(Debug, Subcommand)]
pub enum CatalogAction {
    /// Load the built-in starter catalog. Safe to run repeatedly.
    Seed,

    /// List catalog activities.
    List {
        /// Only show one category (TRAVEL, STAY, EXPERIENCE, BUFFER).
        #[arg(long)]
        category: Option<ActivityCategory>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Trip subcommands.
#[derive(Debug, Subcommand)]
pub enum TripAction {
    /// Create a trip. Prints the new trip ID.
    Create {
        /// Trip name.
        #[arg(long)]
        name: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: NaiveDate,

        /// Total trip budget.
        #[arg(long, default_value_t = 0.0)]
        budget: f64,

        /// Owner name; defaults to the configured owner.
        #[arg(long)]
        owner: Option<String>,
    },

    /// List trips with their derived status.
    List {
        /// Only show trips with this status (derived from today's date).
        #[arg(long)]
        status: Option<StatusFilter>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a trip with its sections and scheduled activities.
    Show {
        /// The trip ID.
        trip: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Update a trip. Omitted fields are left unchanged.
    Update {
        /// The trip ID.
        trip: String,

        #[arg(long)]
        name: Option<String>,

        /// New start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// New end date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        budget: Option<f64>,
    },

    /// Delete a trip, its sections, and their scheduled activities.
    Delete {
        /// The trip ID.
        trip: String,
    },

    /// Duplicate a trip, translating all dates to a new anchor.
    Copy {
        /// The trip ID.
        trip: String,

        /// New start date; defaults to today.
        #[arg(long)]
        anchor: Option<NaiveDate>,

        /// Name for the copy; defaults to the original name plus " (Copy)".
        #[arg(long)]
        name: Option<String>,
    },
}

/// Section subcommands.
#[derive(Debug, Subcommand)]
pub enum SectionAction {
    /// Add a section to a trip. Prints the new section ID.
    Add {
        /// The trip ID.
        trip: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: NaiveDate,

        /// Section budget.
        #[arg(long, default_value_t = 0.0)]
        budget: f64,

        /// Display order index.
        #[arg(long, default_value_t = 0)]
        order: i64,
    },

    /// Update a section. Omitted fields are left unchanged.
    Update {
        /// The section ID.
        section: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// New start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// New end date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        budget: Option<f64>,

        /// Display order index.
        #[arg(long)]
        order: Option<i64>,
    },

    /// Remove a section and its scheduled activities.
    Remove {
        /// The section ID.
        section: String,
    },
}

/// Scheduled-activity subcommands.
#[derive(Debug, Subcommand)]
pub enum ActivityAction {
    /// Schedule a catalog activity in a section. Prints the new instance ID.
    Schedule {
        /// The section ID.
        section: String,

        /// The catalog activity ID.
        #[arg(long)]
        activity: String,

        /// Scheduled date (YYYY-MM-DD), within the section's range.
        #[arg(long)]
        date: NaiveDate,

        /// Advisory time of day (HH:MM). Not used by any scheduling logic.
        #[arg(long)]
        time: Option<String>,

        /// Expense override; zero uses the catalog base cost.
        #[arg(long, default_value_t = 0.0)]
        expense: f64,

        /// Display order index.
        #[arg(long, default_value_t = 0)]
        order: i64,
    },

    /// Update a scheduled activity. Omitted fields are left unchanged.
    Update {
        /// The scheduled activity ID.
        instance: String,

        /// New scheduled date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Advisory time of day (HH:MM).
        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        expense: Option<f64>,

        /// Display order index.
        #[arg(long)]
        order: Option<i64>,
    },

    /// Remove a scheduled activity from its section.
    Remove {
        /// The scheduled activity ID.
        instance: String,
    },
}

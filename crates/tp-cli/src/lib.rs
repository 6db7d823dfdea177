//! Trip planner CLI library.
//!
//! This crate provides the CLI interface for the trip planner.

mod cli;
pub mod commands;
mod config;

pub use cli::{ActivityAction, CatalogAction, Cli, Commands, SectionAction, StatusFilter, TripAction};
pub use config::Config;

//! CLI subcommand implementations.

pub mod activities;
pub mod catalog;
pub mod report;
pub mod sections;
pub mod trips;

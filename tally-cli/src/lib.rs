//! Tally CLI - Command-line runner for tally SQL migrations.
//!
//! This crate provides the `tally` binary, which loads migration groups
//! described in `tally.toml` and applies them to PostgreSQL or MySQL.

pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod output;

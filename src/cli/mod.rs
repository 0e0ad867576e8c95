//! CLI module for roster-sync
//!
//! Offline tooling around the directory controller:
//! - `diff`: patch operations between two team documents
//! - `validate`: new-team form validation against existing teams
//! - `inspect`: drive the controller over a fixture directory

pub mod diff;
pub mod inspect;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// roster-sync - Team membership and roster synchronization
#[derive(Parser)]
#[command(name = "roster-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the patch that turns one team document into another
    Diff(diff::DiffArgs),

    /// Validate a new team against the existing ones
    Validate(validate::ValidateArgs),

    /// Navigate the controller over a fixture directory and print its state
    Inspect(inspect::InspectArgs),
}

/// Load configuration and install logging
pub fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

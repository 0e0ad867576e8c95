//! Validate command - checks a new-team candidate

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use tracing::info;

use crate::domain::team::{CreateTeamRequest, Team, TeamFormValidator};

/// Arguments for the validate command
#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// JSON array of existing teams
    #[arg(long)]
    pub teams: PathBuf,

    /// New team candidate
    #[arg(long)]
    pub candidate: PathBuf,
}

/// Prints the field errors; exits with 1 when there are any
pub fn run(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let teams: Vec<Team> = super::read_json(&args.teams)?;
    let candidate: CreateTeamRequest = super::read_json(&args.candidate)?;

    let errors = TeamFormValidator::new().validate(&candidate, &teams);
    println!("{}", serde_json::to_string_pretty(&errors)?);

    if errors.is_empty() {
        info!(name = %candidate.name, "Candidate is valid");
        Ok(ExitCode::SUCCESS)
    } else {
        info!(name = %candidate.name, errors = errors.len(), "Candidate is invalid");
        Ok(ExitCode::FAILURE)
    }
}

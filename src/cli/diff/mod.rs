//! Diff command - prints patch operations between two documents

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use serde_json::Value;
use tracing::debug;

use crate::domain::patch;

/// Arguments for the diff command
#[derive(Args, Clone)]
pub struct DiffArgs {
    /// Document before the edit
    #[arg(long)]
    pub before: PathBuf,

    /// Document after the edit
    #[arg(long)]
    pub after: PathBuf,
}

pub fn run(args: DiffArgs) -> anyhow::Result<ExitCode> {
    let before: Value = super::read_json(&args.before)?;
    let after: Value = super::read_json(&args.after)?;

    let ops = patch::diff(&before, &after);
    debug!(ops = ops.len(), "Computed patch");

    println!("{}", serde_json::to_string_pretty(&ops)?);
    Ok(ExitCode::SUCCESS)
}

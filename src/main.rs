use std::process::ExitCode;

use clap::Parser;
use roster_sync::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli::bootstrap();

    match cli.command {
        Command::Diff(args) => cli::diff::run(args),
        Command::Validate(args) => cli::validate::run(args),
        Command::Inspect(args) => cli::inspect::run(args, &config).await,
    }
}

//! Inspect command - runs the controller against a fixture directory

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::infrastructure::controller::{DirectoryController, Route};
use crate::infrastructure::directory::{DirectoryFixture, InMemoryDirectoryClient};
use crate::infrastructure::user::InMemoryUserCache;

/// Arguments for the inspect command
#[derive(Args, Clone)]
pub struct InspectArgs {
    /// JSON document with `teams` and `users`
    #[arg(long)]
    pub fixture: PathBuf,

    /// Route segment: a team name or one of users, admins, bots
    #[arg(long)]
    pub route: Option<String>,
}

pub async fn run(args: InspectArgs, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let fixture: DirectoryFixture = super::read_json(&args.fixture)?;
    info!(
        teams = fixture.teams.len(),
        users = fixture.users.len(),
        "Loaded fixture"
    );

    let controller = DirectoryController::new(
        Arc::new(InMemoryDirectoryClient::from_fixture(fixture)),
        Arc::new(InMemoryUserCache::new()),
        config.directory.clone(),
    );
    let mut notifications = controller.notifications();

    controller
        .navigate(Route::parse(args.route.as_deref()))
        .await;

    let mut failed = false;
    while let Ok(notification) = notifications.try_recv() {
        warn!(message = %notification.message, detail = ?notification.detail, "Notification");
        failed = true;
    }

    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

//! roster-sync
//!
//! Keeps an organizational directory's teams and memberships in sync with
//! what an administrator sees and edits:
//! - Role-partitioned user directory with live filtering
//! - Cursor and search pagination over a team's roster
//! - Minimal JSON patches for team and user edits
//! - New-team form validation

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::controller::{DirectoryController, DirectorySnapshot, Notification, Route};

//! Read model published to the presentation layer

use serde::Serialize;

use crate::domain::directory::Paging;
use crate::domain::roster::{ListingMode, RolePartitions};
use crate::domain::team::{Team, ValidationErrors};
use crate::domain::user::{User, UserRole};
use crate::domain::DomainError;

/// Page the controller is routed to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Route {
    /// Unfiltered team listing; the first team is selected once teams load
    #[default]
    Listing,
    /// A single team, by name
    Team(String),
    /// Flat user directory filtered to one role tab
    Users(UserRole),
}

impl Route {
    /// Parse the optional route segment: a role slug, a team name, or nothing
    pub fn parse(segment: Option<&str>) -> Self {
        match segment.map(str::trim).filter(|segment| !segment.is_empty()) {
            None => Self::Listing,
            Some(segment) => match UserRole::from_slug(segment) {
                Some(role) => Self::Users(role),
                None => Self::Team(segment.to_string()),
            },
        }
    }

    pub fn role_tab(&self) -> Option<UserRole> {
        match self {
            Self::Users(role) => Some(*role),
            _ => None,
        }
    }

    pub fn team_name(&self) -> Option<&str> {
        match self {
            Self::Team(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing => write!(f, "/teams"),
            Self::Team(name) => write!(f, "/teams/{}", name),
            Self::Users(role) => write!(f, "/teams/{}", role.slug()),
        }
    }
}

/// Which of the mutually exclusive selections is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selection {
    NoTeam,
    Team,
    RoleTab(UserRole),
}

/// Presentation flags for dialogs and inline editors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiFlags {
    pub adding_team: bool,
    pub adding_users: bool,
    pub description_editable: bool,
    /// Team awaiting delete confirmation
    pub deleting_team: Option<Team>,
}

/// Everything the presentation layer renders, as of one state change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectorySnapshot {
    pub route: Route,
    pub teams: Vec<Team>,
    pub current_team: Option<Team>,
    pub roster: Vec<User>,
    pub paging: Paging,
    pub listing_mode: ListingMode,
    pub partitions: RolePartitions,
    pub active_tab: Option<UserRole>,
    pub selected_users: Vec<User>,
    pub user_search_term: String,
    pub validation_errors: Option<ValidationErrors>,
    pub is_loading: bool,
    pub flags: UiFlags,
}

impl DirectorySnapshot {
    pub fn selection(&self) -> Selection {
        match (self.active_tab, &self.current_team) {
            (Some(role), _) => Selection::RoleTab(role),
            (None, Some(_)) => Selection::Team,
            (None, None) => Selection::NoTeam,
        }
    }

    pub fn team_users_search_term(&self) -> &str {
        self.listing_mode.search_term()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Non-blocking user notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    /// What the user was trying to do
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(message: impl Into<String>, err: &DomainError) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            detail: Some(err.to_string()),
        }
    }
}

/// Notification texts
pub mod messages {
    pub const FETCH_TEAMS_ERROR: &str = "Error while fetching teams!";
    pub const FETCH_TEAM_ERROR: &str = "Error while fetching team!";
    pub const FETCH_TEAM_USERS_ERROR: &str = "Error while fetching team users!";
    pub const SEARCH_TEAM_USERS_ERROR: &str = "Error while searching team users!";
    pub const FETCH_USERS_ERROR: &str = "Error while fetching users!";
    pub const CREATE_TEAM_ERROR: &str = "Error while creating team!";
    pub const UPDATE_TEAM_ERROR: &str = "Error while updating team!";
    pub const DELETE_TEAM_ERROR: &str = "Error while deleting team!";
    pub const UPDATE_USER_ERROR: &str = "Error while updating user!";
    pub const DELETE_USER_ERROR: &str = "Error while deleting user!";
    pub const JOIN_TEAM_ERROR: &str = "Error while joining the team!";
    pub const JOIN_TEAM_SUCCESS: &str = "Team joined successfully!";
}

//! Request and response shapes for directory listings and search

use serde::{Deserialize, Serialize};

use crate::domain::team::{EntityReference, TeamId};
use crate::domain::user::{User, UserId};

/// Direction to move a cursor listing in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorDirection {
    Before,
    After,
}

/// Paging block of a listing response
///
/// Cursor listings carry opaque `before`/`after` tokens; search listings
/// only carry `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default)]
    pub total: u64,
}

impl Paging {
    pub fn total_only(total: u64) -> Self {
        Self {
            before: None,
            after: None,
            total,
        }
    }

    pub fn token(&self, direction: CursorDirection) -> Option<&str> {
        match direction {
            CursorDirection::Before => self.before.as_deref(),
            CursorDirection::After => self.after.as_deref(),
        }
    }

    pub fn has_cursors(&self) -> bool {
        self.before.is_some() || self.after.is_some()
    }
}

/// Cursor listing of users, optionally scoped to a team by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListQuery {
    pub query: String,
    pub page_size: usize,
    pub team: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl UserListQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_cursor(mut self, direction: CursorDirection, token: impl Into<String>) -> Self {
        match direction {
            CursorDirection::Before => self.before = Some(token.into()),
            CursorDirection::After => self.after = Some(token.into()),
        }
        self
    }
}

/// One page of a cursor listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    pub data: Vec<User>,
    #[serde(default)]
    pub paging: Paging,
}

/// Page-numbered full-text search against a search index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSearchQuery {
    pub term: String,
    /// 1-based
    pub page: u32,
    pub page_size: usize,
    pub filter: String,
    pub index: String,
}

impl UserSearchQuery {
    /// Search scoped to members of one team
    pub fn for_team(
        term: impl Into<String>,
        page: u32,
        page_size: usize,
        team_id: &TeamId,
        index: impl Into<String>,
    ) -> Self {
        Self {
            term: term.into(),
            page,
            page_size,
            filter: team_filter(team_id),
            index: index.into(),
        }
    }
}

/// Filter expression restricting search hits to a team's members
pub fn team_filter(team_id: &TeamId) -> String {
    format!("(teams:{})", team_id)
}

/// Inverse of [`team_filter`]
pub fn parse_team_filter(filter: &str) -> Option<&str> {
    filter
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .strip_prefix("teams:")
        .filter(|id| !id.is_empty())
}

/// Search response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: SearchHits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    pub hits: Vec<SearchHit>,
    pub total: SearchTotal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTotal {
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_source")]
    pub source: UserSearchSource,
}

/// Indexed user document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSearchSource {
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub teams: Vec<EntityReference>,
}

impl From<&User> for UserSearchSource {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.as_str().to_string(),
            name: user.name.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            is_bot: user.is_bot,
            teams: user.teams.clone(),
        }
    }
}

/// Convert search hits into user records
pub fn format_users_response(hits: &[SearchHit]) -> Vec<User> {
    hits.iter()
        .map(|hit| {
            let source = &hit.source;
            User {
                id: UserId::new(source.user_id.clone()),
                name: source.name.clone(),
                display_name: source.display_name.clone(),
                email: source.email.clone(),
                href: None,
                is_admin: source.is_admin,
                is_bot: source.is_bot,
                teams: source.teams.clone(),
            }
        })
        .collect()
}

//! Team entity and related types

use serde::{Deserialize, Serialize};

use crate::domain::user::User;

/// Opaque team identifier assigned by the directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lightweight back-reference to an entity owned by the directory
///
/// Membership lists hold these, never the full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl EntityReference {
    pub const USER: &'static str = "user";
    pub const TEAM: &'static str = "team";

    /// Reference to a user, as appended to a team's membership list
    pub fn user(user: &User) -> Self {
        Self {
            id: user.id.as_str().to_string(),
            entity_type: Self::USER.to_string(),
            name: Some(user.name.clone()),
            display_name: None,
            description: Some(user.display_name.clone().unwrap_or_default()),
            href: user.href.clone(),
        }
    }

    /// Reference to a team, as appended to a user's team list
    pub fn team(team: &Team) -> Self {
        Self {
            id: team.id.as_str().to_string(),
            entity_type: Self::TEAM.to_string(),
            name: Some(team.name.clone()),
            display_name: team.display_name.clone(),
            description: None,
            href: team.href.clone(),
        }
    }
}

/// Team record as returned by the directory
///
/// `name` is immutable after creation and unique across teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub users: Vec<EntityReference>,
    #[serde(default)]
    pub owns: Vec<EntityReference>,
    #[serde(default)]
    pub default_roles: Vec<EntityReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityReference>,
}

impl Team {
    /// Create a team record with no members
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
            description: None,
            href: None,
            users: Vec::new(),
            owns: Vec::new(),
            default_roles: Vec::new(),
            owner: None,
        }
    }

    /// Set display name (builder pattern)
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set description (builder pattern)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set members (builder pattern)
    pub fn with_users(mut self, users: Vec<EntityReference>) -> Self {
        self.users = users;
        self
    }

    /// Check whether a user is listed as a member
    pub fn has_member(&self, user_id: &str) -> bool {
        self.users.iter().any(|member| member.id == user_id)
    }

    /// Candidate snapshot with the given references appended to the membership list
    pub fn with_members_added(&self, added: &[EntityReference]) -> Self {
        let mut after = self.clone();
        after.users.extend(added.iter().cloned());
        after
    }

    /// Candidate snapshot with one member dropped
    pub fn with_member_removed(&self, user_id: &str) -> Self {
        let mut after = self.clone();
        after.users.retain(|member| member.id != user_id);
        after
    }
}

impl From<String> for TeamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Related fields requested alongside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeamField {
    Users,
    Owns,
    DefaultRoles,
    Owner,
}

impl TeamField {
    /// Field set the roster views need
    pub const ALL: [TeamField; 4] = [Self::Users, Self::Owns, Self::DefaultRoles, Self::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Owns => "owns",
            Self::DefaultRoles => "defaultRoles",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for TeamField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal payload submitted when creating a team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateTeamRequest {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

//! User entity and role partitions

use serde::{Deserialize, Serialize};

use crate::domain::team::EntityReference;

/// Opaque user identifier assigned by the directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutually exclusive user category derived from the admin and bot flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Regular,
    Admin,
    Bot,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [Self::Regular, Self::Admin, Self::Bot];

    /// Route segment naming this role's tab
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Regular => "users",
            Self::Admin => "admins",
            Self::Bot => "bots",
        }
    }

    /// Parse a route segment into a role tab
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.slug() == slug)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// User record as returned by the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub teams: Vec<EntityReference>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: None,
            email: None,
            href: None,
            is_admin: false,
            is_bot: false,
            teams: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// Role partition; the bot flag wins over the admin flag
    pub fn role(&self) -> UserRole {
        if self.is_bot {
            UserRole::Bot
        } else if self.is_admin {
            UserRole::Admin
        } else {
            UserRole::Regular
        }
    }

    /// Name shown in lists: the display name when present, the login name otherwise
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(display_name) if !display_name.is_empty() => display_name,
            _ => &self.name,
        }
    }

    pub fn belongs_to(&self, team_id: &str) -> bool {
        self.teams.iter().any(|team| team.id == team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_precedence() {
        let regular = User::new(UserId::new("u1"), "alice");
        let admin = User::new(UserId::new("u2"), "bob").admin();
        let bot = User::new(UserId::new("u3"), "ingestion").bot();
        let admin_bot = User::new(UserId::new("u4"), "robot").admin().bot();

        assert_eq!(regular.role(), UserRole::Regular);
        assert_eq!(admin.role(), UserRole::Admin);
        assert_eq!(bot.role(), UserRole::Bot);
        assert_eq!(admin_bot.role(), UserRole::Bot);
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let named = User::new(UserId::new("u1"), "alice").with_display_name("Alice A");
        let unnamed = User::new(UserId::new("u2"), "bob");
        let blank = User::new(UserId::new("u3"), "carol").with_display_name("");

        assert_eq!(named.label(), "Alice A");
        assert_eq!(unnamed.label(), "bob");
        assert_eq!(blank.label(), "carol");
    }

    #[test]
    fn test_role_slugs() {
        assert_eq!(UserRole::from_slug("admins"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_slug("bots"), Some(UserRole::Bot));
        assert_eq!(UserRole::from_slug("users"), Some(UserRole::Regular));
        assert_eq!(UserRole::from_slug("data-eng"), None);
    }

    #[test]
    fn test_deserialize_flags_default_false() {
        let user: User =
            serde_json::from_str(r#"{"id":"u1","name":"alice","displayName":"Alice"}"#).unwrap();

        assert!(!user.is_admin);
        assert!(!user.is_bot);
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }
}

//! Directory client trait

use async_trait::async_trait;

use super::query::{SearchResponse, UserListQuery, UserPage, UserSearchQuery};
use crate::domain::patch::PatchOperation;
use crate::domain::team::{CreateTeamRequest, Team, TeamField, TeamId};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Remote organizational directory of teams and users
///
/// Implementations map transport failures to [`DomainError::Transport`] and
/// empty or malformed success payloads to [`DomainError::UnexpectedResponse`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// List all teams with the requested related fields
    async fn list_teams(&self, fields: &[TeamField]) -> Result<Vec<Team>, DomainError>;

    /// Fetch one team by its unique name
    async fn get_team(&self, name: &str, fields: &[TeamField]) -> Result<Team, DomainError>;

    /// Create a team from the minimal creation payload
    async fn create_team(&self, request: CreateTeamRequest) -> Result<Team, DomainError>;

    /// Apply patch operations to a team
    async fn patch_team(&self, id: &TeamId, ops: Vec<PatchOperation>)
    -> Result<Team, DomainError>;

    /// Delete a team
    async fn delete_team(&self, id: &TeamId) -> Result<(), DomainError>;

    /// Cursor listing of users
    async fn list_users(&self, query: UserListQuery) -> Result<UserPage, DomainError>;

    /// Page-numbered search over the user index
    async fn search_users(&self, query: UserSearchQuery) -> Result<SearchResponse, DomainError>;

    /// Apply patch operations to a user
    async fn update_user(&self, id: &UserId, ops: Vec<PatchOperation>)
    -> Result<User, DomainError>;

    /// Delete a user
    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError>;
}

//! User directory cache trait

use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Process-local copy of the user directory
///
/// Injected into the controller, which reloads it on every navigation and
/// writes through it after user updates and deletions. Nothing else may
/// mutate it.
#[cfg_attr(test, automock)]
pub trait UserCache: Send + Sync + Debug {
    /// All cached users, in directory order
    fn users(&self) -> Result<Vec<User>, DomainError>;

    /// Replace the whole cache with a freshly loaded listing
    fn replace_all(&self, users: Vec<User>) -> Result<(), DomainError>;

    /// Replace a cached user by id, appending it when unknown
    fn upsert(&self, user: User) -> Result<(), DomainError>;

    /// Drop a user; returns whether it was cached
    fn remove(&self, id: &UserId) -> Result<bool, DomainError>;

    /// Mark the cache stale so the next navigation reloads it
    fn invalidate(&self) -> Result<(), DomainError>;

    /// Whether a listing has been loaded since the last invalidation
    fn is_loaded(&self) -> Result<bool, DomainError>;
}

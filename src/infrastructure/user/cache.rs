//! In-memory user directory cache

use std::sync::RwLock;

use crate::domain::user::{User, UserCache, UserId};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct CacheState {
    users: Vec<User>,
    loaded: bool,
}

/// Thread-safe in-memory [`UserCache`]
///
/// Lives as long as its owner; an invalidated cache keeps serving its last
/// listing until the next reload replaces it.
#[derive(Debug, Default)]
pub struct InMemoryUserCache {
    state: RwLock<CacheState>,
}

impl InMemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with a loaded listing
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            state: RwLock::new(CacheState {
                users,
                loaded: true,
            }),
        }
    }
}

impl UserCache for InMemoryUserCache {
    fn users(&self) -> Result<Vec<User>, DomainError> {
        let state = self.state.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(state.users.clone())
    }

    fn replace_all(&self, users: Vec<User>) -> Result<(), DomainError> {
        let mut state = self.state.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        state.users = users;
        state.loaded = true;
        Ok(())
    }

    fn upsert(&self, user: User) -> Result<(), DomainError> {
        let mut state = self.state.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        match state.users.iter_mut().find(|cached| cached.id == user.id) {
            Some(cached) => *cached = user,
            None => state.users.push(user),
        }

        Ok(())
    }

    fn remove(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut state = self.state.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        let before = state.users.len();
        state.users.retain(|user| &user.id != id);
        Ok(state.users.len() != before)
    }

    fn invalidate(&self) -> Result<(), DomainError> {
        let mut state = self.state.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        state.loaded = false;
        Ok(())
    }

    fn is_loaded(&self) -> Result<bool, DomainError> {
        let state = self.state.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(state.loaded)
    }
}

//! User domain module

mod entity;
mod repository;

pub use entity::{User, UserId, UserRole};
pub use repository::UserCache;

#[cfg(test)]
pub use repository::MockUserCache;

//! User infrastructure implementations

mod cache;

pub use cache::InMemoryUserCache;

//! Infrastructure layer - Directory clients, caches and the controller

pub mod controller;
pub mod directory;
pub mod logging;
pub mod user;

//! Directory controller and the read model it publishes

mod directory_controller;
mod snapshot;

pub use directory_controller::DirectoryController;
pub use snapshot::{
    messages, DirectorySnapshot, Notification, NotificationLevel, Route, Selection, UiFlags,
};

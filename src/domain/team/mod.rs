//! Team domain module
//!
//! Teams are owned by the remote directory; these are transient copies held
//! between fetches, plus the rules a new team must satisfy before submission.

mod entity;
mod validation;

pub use entity::{CreateTeamRequest, EntityReference, Team, TeamField, TeamId};
pub use validation::{
    is_url_friendly_name, FormState, TeamFormField, TeamFormValidator, ValidationErrors,
    MAX_TEAM_NAME_LENGTH,
};

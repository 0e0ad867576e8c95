//! Domain layer - Entities, boundary traits and pure roster logic

pub mod directory;
pub mod error;
pub mod generation;
pub mod patch;
pub mod roster;
pub mod team;
pub mod user;

pub use directory::{
    CursorDirection, DirectoryClient, Paging, SearchResponse, UserListQuery, UserPage,
    UserSearchQuery,
};
pub use error::DomainError;
pub use generation::RequestGeneration;
pub use patch::{apply, diff, diff_entities, PatchError, PatchOperation};
pub use roster::{
    ListingMode, PageTarget, PaginationCursorManager, RolePartitions, RosterFilter,
};
pub use team::{
    CreateTeamRequest, EntityReference, FormState, Team, TeamField, TeamFormField,
    TeamFormValidator, TeamId, ValidationErrors,
};
pub use user::{User, UserCache, UserId, UserRole};

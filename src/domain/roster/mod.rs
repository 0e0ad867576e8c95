//! Roster views: role-partitioned user directory and paginated team membership

mod filter;
mod pagination;

pub use filter::{matches_term, RolePartitions, RosterFilter};
pub use pagination::{
    Completion, IssuedRequest, ListingMode, PageCursor, PageTarget, PaginationCursorManager,
    RosterRequest,
};

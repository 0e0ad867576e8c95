//! Directory boundary: the remote team and user service the controller talks to

mod client;
mod query;

pub use client::DirectoryClient;
pub use query::{
    format_users_response, parse_team_filter, team_filter, CursorDirection, Paging, SearchHit,
    SearchHits, SearchResponse, SearchTotal, UserListQuery, UserPage, UserSearchQuery,
    UserSearchSource,
};

#[cfg(test)]
pub use client::MockDirectoryClient;

//! Cursor and search pagination over a team's member roster

use serde::Serialize;
use tracing::debug;

use crate::domain::directory::{
    format_users_response, CursorDirection, Paging, SearchResponse, UserListQuery, UserPage,
    UserSearchQuery,
};
use crate::domain::generation::RequestGeneration;
use crate::domain::team::{Team, TeamId};
use crate::domain::user::User;
use crate::domain::DomainError;

/// Cursor position a listing request was issued from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    pub direction: CursorDirection,
    pub token: String,
}

/// How the roster is currently being browsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ListingMode {
    /// Exact team membership in directory order
    Cursor { cursor: Option<PageCursor> },
    /// Ranked hits from the search index, scoped to the team
    Search { term: String, page: u32 },
}

impl Default for ListingMode {
    fn default() -> Self {
        Self::Cursor { cursor: None }
    }
}

impl ListingMode {
    pub fn is_search(&self) -> bool {
        matches!(self, Self::Search { .. })
    }

    pub fn search_term(&self) -> &str {
        match self {
            Self::Search { term, .. } => term,
            Self::Cursor { .. } => "",
        }
    }
}

/// Where to move the roster listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    Cursor(CursorDirection),
    Page(u32),
}

/// Directory call the caller must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterRequest {
    Cursor(UserListQuery),
    Search(UserSearchQuery),
}

/// A request tagged with the generation its completion must present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRequest {
    pub generation: u64,
    pub request: RosterRequest,
}

/// Outcome of handing a response back to the manager
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied,
    /// A newer request was issued; the response was dropped
    Stale,
    Failed(DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TeamScope {
    id: TeamId,
    name: String,
}

/// Owns the roster page of the current team and the listing mode that produced it
///
/// The manager never performs I/O: it hands out [`IssuedRequest`]s and takes
/// their results back, swapping whole pages in on success.
#[derive(Debug, Clone)]
pub struct PaginationCursorManager {
    scope: Option<TeamScope>,
    mode: ListingMode,
    roster: Vec<User>,
    paging: Paging,
    page_size: usize,
    search_index: String,
    generation: RequestGeneration,
}

impl PaginationCursorManager {
    pub fn new(page_size: usize, search_index: impl Into<String>) -> Self {
        Self {
            scope: None,
            mode: ListingMode::default(),
            roster: Vec::new(),
            paging: Paging::default(),
            page_size,
            search_index: search_index.into(),
            generation: RequestGeneration::new(),
        }
    }

    /// Scope the roster to a team and return to cursor mode
    pub fn set_team(&mut self, team: &Team) {
        let scope = TeamScope {
            id: team.id.clone(),
            name: team.name.clone(),
        };

        if self.scope.as_ref() != Some(&scope) {
            self.roster.clear();
            self.paging = Paging::default();
        }

        self.scope = Some(scope);
        self.mode = ListingMode::default();
    }

    /// Drop the team scope; in-flight responses become stale
    pub fn clear_team(&mut self) {
        self.scope = None;
        self.mode = ListingMode::default();
        self.roster.clear();
        self.paging = Paging::default();
        self.generation.issue();
    }

    /// Issue a cursor listing, optionally moving in a direction from the current page
    ///
    /// Returns `None` without a team scope, or when the current page has no
    /// token for the requested direction.
    pub fn fetch_by_cursor(&mut self, direction: Option<CursorDirection>) -> Option<IssuedRequest> {
        let scope = self.scope.as_ref()?;
        let mut query = UserListQuery::new(self.page_size).with_team(scope.name.clone());

        let cursor = match direction {
            Some(direction) => {
                let token = self.paging.token(direction)?.to_string();
                query = query.with_cursor(direction, token.clone());
                Some(PageCursor { direction, token })
            }
            None => None,
        };

        self.mode = ListingMode::Cursor { cursor };

        Some(IssuedRequest {
            generation: self.generation.issue(),
            request: RosterRequest::Cursor(query),
        })
    }

    /// Issue a team-scoped search for the given 1-based page
    pub fn fetch_by_search(&mut self, term: &str, page: u32) -> Option<IssuedRequest> {
        let scope = self.scope.as_ref()?;
        let page = page.max(1);
        let query = UserSearchQuery::for_team(
            term,
            page,
            self.page_size,
            &scope.id,
            self.search_index.clone(),
        );

        self.mode = ListingMode::Search {
            term: term.to_string(),
            page,
        };

        Some(IssuedRequest {
            generation: self.generation.issue(),
            request: RosterRequest::Search(query),
        })
    }

    /// Switch modes by search term: non-empty searches from page 1, empty
    /// discards search paging and re-lists by cursor
    pub fn set_search_term(&mut self, term: &str) -> Option<IssuedRequest> {
        if term.is_empty() {
            self.paging = Paging::default();
            self.fetch_by_cursor(None)
        } else {
            self.fetch_by_search(term, 1)
        }
    }

    /// Move within the current mode; targets of the other mode are ignored
    pub fn paginate(&mut self, target: PageTarget) -> Option<IssuedRequest> {
        match (&self.mode, target) {
            (ListingMode::Cursor { .. }, PageTarget::Cursor(direction)) => {
                self.fetch_by_cursor(Some(direction))
            }
            (ListingMode::Search { term, .. }, PageTarget::Page(page)) => {
                let term = term.clone();
                self.fetch_by_search(&term, page)
            }
            (mode, target) => {
                debug!(?mode, ?target, "Ignoring page target for inactive listing mode");
                None
            }
        }
    }

    /// Take back the result of a cursor listing
    pub fn complete_cursor(
        &mut self,
        generation: u64,
        result: Result<UserPage, DomainError>,
    ) -> Completion {
        if !self.generation.is_current(generation) {
            return Completion::Stale;
        }

        match result {
            Ok(page) => {
                self.roster = page.data;
                self.paging = page.paging;
                Completion::Applied
            }
            Err(err) => Completion::Failed(err),
        }
    }

    /// Take back the result of a search; failures clear the roster
    pub fn complete_search(
        &mut self,
        generation: u64,
        result: Result<SearchResponse, DomainError>,
    ) -> Completion {
        if !self.generation.is_current(generation) {
            return Completion::Stale;
        }

        match result {
            Ok(response) => {
                self.roster = format_users_response(&response.hits.hits);
                self.paging = Paging::total_only(response.hits.total.value);
                Completion::Applied
            }
            Err(err) => {
                self.roster.clear();
                self.paging = Paging::default();
                Completion::Failed(err)
            }
        }
    }

    pub fn roster(&self) -> &[User] {
        &self.roster
    }

    pub fn paging(&self) -> &Paging {
        &self.paging
    }

    pub fn mode(&self) -> &ListingMode {
        &self.mode
    }

    pub fn team_name(&self) -> Option<&str> {
        self.scope.as_ref().map(|scope| scope.name.as_str())
    }
}

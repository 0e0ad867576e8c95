//! In-memory directory implementation

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::directory::{
    parse_team_filter, DirectoryClient, Paging, SearchHit, SearchHits, SearchResponse,
    SearchTotal, UserListQuery, UserPage, UserSearchQuery, UserSearchSource,
};
use crate::domain::patch::{apply_to_entity, PatchOperation};
use crate::domain::roster::matches_term;
use crate::domain::team::{CreateTeamRequest, EntityReference, Team, TeamField, TeamId};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

/// Seed data for an in-memory directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFixture {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub users: Vec<User>,
}

/// In-process [`DirectoryClient`]
///
/// Useful for testing and local inspection. Team membership lives on the
/// team's `users` list and is mirrored into each user's `teams` list on
/// every write.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryClient {
    state: RwLock<DirectoryFixture>,
}

impl InMemoryDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from fixture data; users' team lists are rebuilt from team membership
    pub fn from_fixture(mut fixture: DirectoryFixture) -> Self {
        for team in fixture.teams.clone() {
            mirror_team_members(&mut fixture, &team);
        }

        Self {
            state: RwLock::new(fixture),
        }
    }

    /// Current contents, for assertions and dumps
    pub fn fixture(&self) -> Result<DirectoryFixture, DomainError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DirectoryFixture>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DirectoryFixture>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectoryClient {
    async fn list_teams(&self, fields: &[TeamField]) -> Result<Vec<Team>, DomainError> {
        let state = self.read()?;
        let mut teams: Vec<Team> = state
            .teams
            .iter()
            .map(|team| project_fields(team, fields))
            .collect();

        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn get_team(&self, name: &str, fields: &[TeamField]) -> Result<Team, DomainError> {
        let state = self.read()?;

        state
            .teams
            .iter()
            .find(|team| team.name == name)
            .map(|team| project_fields(team, fields))
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", name)))
    }

    async fn create_team(&self, request: CreateTeamRequest) -> Result<Team, DomainError> {
        let mut state = self.write()?;
        let lowered = request.name.to_lowercase();

        if state.teams.iter().any(|team| team.name.to_lowercase() == lowered) {
            return Err(DomainError::conflict(format!(
                "Team '{}' already exists",
                request.name
            )));
        }

        let mut team = Team::new(Uuid::new_v4().to_string(), request.name)
            .with_display_name(request.display_name);
        team.description = request.description;

        debug!(id = %team.id, name = %team.name, "Created team");
        state.teams.push(team.clone());
        Ok(team)
    }

    async fn patch_team(
        &self,
        id: &TeamId,
        ops: Vec<PatchOperation>,
    ) -> Result<Team, DomainError> {
        let mut state = self.write()?;
        let position = state
            .teams
            .iter()
            .position(|team| &team.id == id)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))?;

        let current = &state.teams[position];
        let patched = apply_to_entity(current, &ops)?;

        if patched.id != current.id || patched.name != current.name {
            return Err(DomainError::validation("Team id and name are immutable"));
        }

        state.teams[position] = patched.clone();
        mirror_team_members(&mut state, &patched);
        Ok(patched)
    }

    async fn delete_team(&self, id: &TeamId) -> Result<(), DomainError> {
        let mut state = self.write()?;
        let before = state.teams.len();
        state.teams.retain(|team| &team.id != id);

        if state.teams.len() == before {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        for user in &mut state.users {
            user.teams.retain(|team| team.id != id.as_str());
        }

        Ok(())
    }

    async fn list_users(&self, query: UserListQuery) -> Result<UserPage, DomainError> {
        let state = self.read()?;

        let users: Vec<&User> = match query.team.as_deref() {
            Some(name) => {
                let team = state
                    .teams
                    .iter()
                    .find(|team| team.name == name)
                    .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", name)))?;
                members(&state.users, team).collect()
            }
            None => state.users.iter().collect(),
        };

        let page_size = query.page_size.max(1);
        let offset = match (query.after.as_deref(), query.before.as_deref()) {
            (Some(token), _) | (None, Some(token)) => decode_cursor(token)?,
            (None, None) => 0,
        };

        let total = users.len();
        let next = offset.saturating_add(page_size);
        let data = users
            .into_iter()
            .skip(offset)
            .take(page_size)
            .cloned()
            .collect();

        let paging = Paging {
            before: (offset > 0).then(|| encode_cursor(offset.saturating_sub(page_size))),
            after: (next < total).then(|| encode_cursor(next)),
            total: total as u64,
        };

        Ok(UserPage { data, paging })
    }

    async fn search_users(&self, query: UserSearchQuery) -> Result<SearchResponse, DomainError> {
        let state = self.read()?;

        let team_id = parse_team_filter(&query.filter).ok_or_else(|| {
            DomainError::validation(format!("Unsupported filter '{}'", query.filter))
        })?;

        let team = state
            .teams
            .iter()
            .find(|team| team.id.as_str() == team_id)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team_id)))?;

        let matched: Vec<&User> = members(&state.users, team)
            .filter(|user| {
                query.term == "*" || matches_term(user, &query.term) || matches_name(user, &query.term)
            })
            .collect();

        let page_size = query.page_size.max(1);
        let skip = (query.page.max(1) as usize - 1) * page_size;

        let hits = matched
            .iter()
            .skip(skip)
            .take(page_size)
            .map(|user| SearchHit {
                source: UserSearchSource::from(*user),
            })
            .collect();

        Ok(SearchResponse {
            hits: SearchHits {
                hits,
                total: SearchTotal {
                    value: matched.len() as u64,
                },
            },
        })
    }

    async fn update_user(
        &self,
        id: &UserId,
        ops: Vec<PatchOperation>,
    ) -> Result<User, DomainError> {
        let mut state = self.write()?;
        let position = state
            .users
            .iter()
            .position(|user| &user.id == id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;

        let patched = apply_to_entity(&state.users[position], &ops)?;

        if &patched.id != id {
            return Err(DomainError::validation("User id is immutable"));
        }

        state.users[position] = patched.clone();
        mirror_user_teams(&mut state, &patched);
        Ok(patched)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError> {
        let mut state = self.write()?;
        let before = state.users.len();
        state.users.retain(|user| &user.id != id);

        if state.users.len() == before {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        for team in &mut state.teams {
            team.users.retain(|member| member.id != id.as_str());
        }

        Ok(())
    }
}

fn project_fields(team: &Team, fields: &[TeamField]) -> Team {
    let mut projected = team.clone();

    if !fields.contains(&TeamField::Users) {
        projected.users.clear();
    }
    if !fields.contains(&TeamField::Owns) {
        projected.owns.clear();
    }
    if !fields.contains(&TeamField::DefaultRoles) {
        projected.default_roles.clear();
    }
    if !fields.contains(&TeamField::Owner) {
        projected.owner = None;
    }

    projected
}

/// Users listed on a team, in membership order
fn members<'a>(users: &'a [User], team: &'a Team) -> impl Iterator<Item = &'a User> + 'a {
    team.users
        .iter()
        .filter_map(move |member| users.iter().find(|user| user.id.as_str() == member.id))
}

fn matches_name(user: &User, term: &str) -> bool {
    user.name.to_lowercase().contains(&term.to_lowercase())
}

fn mirror_team_members(state: &mut DirectoryFixture, team: &Team) {
    let reference = EntityReference::team(team);

    for user in &mut state.users {
        let listed = team.has_member(user.id.as_str());
        let linked = user.belongs_to(team.id.as_str());

        if listed && !linked {
            user.teams.push(reference.clone());
        } else if !listed && linked {
            user.teams.retain(|t| t.id != team.id.as_str());
        }
    }
}

fn mirror_user_teams(state: &mut DirectoryFixture, user: &User) {
    let reference = EntityReference::user(user);

    for team in &mut state.teams {
        let linked = user.belongs_to(team.id.as_str());
        let listed = team.has_member(user.id.as_str());

        if linked && !listed {
            team.users.push(reference.clone());
        } else if !linked && listed {
            team.users.retain(|member| member.id != user.id.as_str());
        }
    }
}

fn encode_cursor(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("offset:{}", offset))
}

fn decode_cursor(token: &str) -> Result<usize, DomainError> {
    let invalid = || DomainError::validation(format!("Invalid cursor '{}'", token));

    let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;

    text.strip_prefix("offset:")
        .and_then(|offset| offset.parse().ok())
        .ok_or_else(invalid)
}

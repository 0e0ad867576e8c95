//! Shared fixtures for controller integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use roster_sync::config::DirectoryConfig;
use roster_sync::domain::directory::{
    DirectoryClient, SearchResponse, UserListQuery, UserPage, UserSearchQuery,
};
use roster_sync::domain::team::{CreateTeamRequest, EntityReference, Team, TeamField, TeamId};
use roster_sync::domain::user::{User, UserId};
use roster_sync::domain::{DomainError, PatchOperation};
use roster_sync::infrastructure::directory::{DirectoryFixture, InMemoryDirectoryClient};
use roster_sync::infrastructure::user::InMemoryUserCache;
use roster_sync::DirectoryController;

/// Holds one matching call until released
#[derive(Debug, Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated call is parked
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// In-memory directory that counts calls and can park selected ones
#[derive(Debug)]
pub struct InstrumentedClient {
    inner: InMemoryDirectoryClient,
    pub get_team_calls: AtomicUsize,
    pub patch_team_calls: AtomicUsize,
    pub create_team_calls: AtomicUsize,
    /// Parks `get_team` for this team name
    pub gated_team: Option<String>,
    /// Parks `search_users` for this term
    pub gated_term: Option<String>,
    /// Parks every `patch_team`
    pub gated_patch: bool,
    pub gate: Gate,
}

impl InstrumentedClient {
    pub fn new(fixture: DirectoryFixture) -> Self {
        Self {
            inner: InMemoryDirectoryClient::from_fixture(fixture),
            get_team_calls: AtomicUsize::new(0),
            patch_team_calls: AtomicUsize::new(0),
            create_team_calls: AtomicUsize::new(0),
            gated_team: None,
            gated_term: None,
            gated_patch: false,
            gate: Gate::default(),
        }
    }

    pub fn gating_team(mut self, name: &str) -> Self {
        self.gated_team = Some(name.to_string());
        self
    }

    pub fn gating_term(mut self, term: &str) -> Self {
        self.gated_term = Some(term.to_string());
        self
    }

    pub fn gating_patch(mut self) -> Self {
        self.gated_patch = true;
        self
    }

    pub fn fixture(&self) -> Result<DirectoryFixture, DomainError> {
        self.inner.fixture()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for InstrumentedClient {
    async fn list_teams(&self, fields: &[TeamField]) -> Result<Vec<Team>, DomainError> {
        self.inner.list_teams(fields).await
    }

    async fn get_team(&self, name: &str, fields: &[TeamField]) -> Result<Team, DomainError> {
        self.get_team_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated_team.as_deref() == Some(name) {
            self.gate.pass().await;
        }
        self.inner.get_team(name, fields).await
    }

    async fn create_team(&self, request: CreateTeamRequest) -> Result<Team, DomainError> {
        self.create_team_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_team(request).await
    }

    async fn patch_team(
        &self,
        id: &TeamId,
        ops: Vec<PatchOperation>,
    ) -> Result<Team, DomainError> {
        self.patch_team_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated_patch {
            self.gate.pass().await;
        }
        self.inner.patch_team(id, ops).await
    }

    async fn delete_team(&self, id: &TeamId) -> Result<(), DomainError> {
        self.inner.delete_team(id).await
    }

    async fn list_users(&self, query: UserListQuery) -> Result<UserPage, DomainError> {
        self.inner.list_users(query).await
    }

    async fn search_users(&self, query: UserSearchQuery) -> Result<SearchResponse, DomainError> {
        if self.gated_term.as_deref() == Some(query.term.as_str()) {
            self.gate.pass().await;
        }
        self.inner.search_users(query).await
    }

    async fn update_user(
        &self,
        id: &UserId,
        ops: Vec<PatchOperation>,
    ) -> Result<User, DomainError> {
        self.inner.update_user(id, ops).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError> {
        self.inner.delete_user(id).await
    }
}

pub fn user(id: &str, name: &str) -> User {
    User::new(UserId::new(id), name)
}

/// Two teams: `core` (t1) with u1 and u2, and `search` (t2) with u3
pub fn fixture() -> DirectoryFixture {
    let u1 = user("u1", "alice").with_display_name("Alice Liddell");
    let u2 = user("u2", "bob").with_display_name("Bob Stone");
    let u3 = user("u3", "carol").admin();
    let u4 = user("u4", "deploy-bot").bot();

    DirectoryFixture {
        teams: vec![
            Team::new("t1", "core")
                .with_display_name("Core")
                .with_users(vec![EntityReference::user(&u1), EntityReference::user(&u2)]),
            Team::new("t2", "search")
                .with_display_name("Search")
                .with_users(vec![EntityReference::user(&u3)]),
        ],
        users: vec![u1, u2, u3, u4],
    }
}

pub fn controller(client: Arc<InstrumentedClient>) -> DirectoryController<InstrumentedClient> {
    DirectoryController::new(
        client,
        Arc::new(InMemoryUserCache::new()),
        DirectoryConfig::default(),
    )
}

//! Directory controller: routing, team selection, roster listing and mutations

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use super::snapshot::{messages, DirectorySnapshot, Notification, Route, UiFlags};
use crate::config::DirectoryConfig;
use crate::domain::directory::{CursorDirection, DirectoryClient, UserListQuery};
use crate::domain::generation::RequestGeneration;
use crate::domain::patch::diff_entities;
use crate::domain::roster::{
    Completion, IssuedRequest, PageTarget, PaginationCursorManager, RosterFilter, RosterRequest,
};
use crate::domain::team::{
    CreateTeamRequest, EntityReference, FormState, Team, TeamField, TeamFormValidator,
    ValidationErrors,
};
use crate::domain::user::{User, UserCache, UserId, UserRole};
use crate::domain::DomainError;

const NOTIFICATION_CAPACITY: usize = 64;

#[derive(Debug)]
struct ControllerState {
    route: Route,
    teams: Vec<Team>,
    current_team: Option<Team>,
    roster: PaginationCursorManager,
    users: RosterFilter,
    form: FormState,
    flags: UiFlags,
    loading: usize,
    teams_generation: RequestGeneration,
    team_generation: RequestGeneration,
}

impl ControllerState {
    fn new(config: &DirectoryConfig) -> Self {
        Self {
            route: Route::Listing,
            teams: Vec::new(),
            current_team: None,
            roster: PaginationCursorManager::new(
                config.page_size,
                config.user_search_index.clone(),
            ),
            users: RosterFilter::default(),
            form: FormState::default(),
            flags: UiFlags::default(),
            loading: 0,
            teams_generation: RequestGeneration::new(),
            team_generation: RequestGeneration::new(),
        }
    }

    fn select_team(&mut self, team: Team) {
        self.roster.set_team(&team);
        self.current_team = Some(team);
    }

    fn clear_team(&mut self) {
        self.current_team = None;
        self.roster.clear_team();
        self.team_generation.issue();
    }

    fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            route: self.route.clone(),
            teams: self.teams.clone(),
            current_team: self.current_team.clone(),
            roster: self.roster.roster().to_vec(),
            paging: self.roster.paging().clone(),
            listing_mode: self.roster.mode().clone(),
            partitions: self.users.partitions().clone(),
            active_tab: self.users.active_tab(),
            selected_users: self.users.selected().to_vec(),
            user_search_term: self.users.search_term().to_string(),
            validation_errors: self.form.errors().cloned(),
            is_loading: self.loading > 0,
            flags: self.flags.clone(),
        }
    }
}

/// Controller state plus the channel every change is published on
///
/// The lock is only ever taken inside synchronous closures, so it is never
/// held across an await point.
#[derive(Debug)]
struct Store {
    state: Mutex<ControllerState>,
    snapshots: watch::Sender<DirectorySnapshot>,
}

impl Store {
    fn update<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut *state);
        self.snapshots.send_replace(state.snapshot());
        result
    }

    fn read<R>(&self, f: impl FnOnce(&ControllerState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*state)
    }
}

/// Holds the loading indicator on while alive
struct LoadingGuard<'a> {
    store: &'a Store,
}

impl<'a> LoadingGuard<'a> {
    fn new(store: &'a Store) -> Self {
        store.update(|state| state.loading += 1);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store
            .update(|state| state.loading = state.loading.saturating_sub(1));
    }
}

/// Coordinates teams, the current team's roster and the user directory
///
/// Every operation reports failures as [`Notification`]s and leaves the
/// published state consistent; none of them return errors to the caller.
#[derive(Debug)]
pub struct DirectoryController<C: DirectoryClient + ?Sized> {
    client: Arc<C>,
    cache: Arc<dyn UserCache>,
    config: DirectoryConfig,
    validator: TeamFormValidator,
    store: Store,
    notifications: broadcast::Sender<Notification>,
}

impl<C: DirectoryClient + ?Sized> DirectoryController<C> {
    /// Create a new directory controller
    pub fn new(client: Arc<C>, cache: Arc<dyn UserCache>, config: DirectoryConfig) -> Self {
        let state = ControllerState::new(&config);
        let (snapshots, _) = watch::channel(state.snapshot());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            client,
            cache,
            config,
            validator: TeamFormValidator::new(),
            store: Store {
                state: Mutex::new(state),
                snapshots,
            },
            notifications,
        }
    }

    /// Replace the new-team validator
    pub fn with_validator(mut self, validator: TeamFormValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Current state
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.store.read(ControllerState::snapshot)
    }

    /// Receiver that always holds the latest published state
    pub fn subscribe(&self) -> watch::Receiver<DirectorySnapshot> {
        self.store.snapshots.subscribe()
    }

    /// Stream of published states, starting with the current one
    pub fn changes(&self) -> WatchStream<DirectorySnapshot> {
        WatchStream::new(self.subscribe())
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    // ---- navigation -------------------------------------------------------

    /// Route to the listing, a team, or a role tab
    ///
    /// Reloads the user cache, clears both search terms and refreshes the
    /// team list. A team route also loads that team unless it is already
    /// current.
    pub async fn navigate(&self, route: Route) {
        info!(route = %route, "Navigating");

        self.store.update(|state| {
            state.route = route.clone();
            state.users.select_tab(route.role_tab());
            if matches!(route, Route::Users(_)) {
                state.clear_team();
            }
        });

        self.reload_user_cache().await;
        self.fetch_teams().await;

        if let Route::Team(name) = &route {
            self.refresh_current_team(name, false).await;

            if self.store.read(|state| state.roster.mode().is_search()) {
                self.search_team_users("").await;
            }
        }
    }

    pub async fn select_team(&self, name: &str) {
        self.navigate(Route::Team(name.to_string())).await;
    }

    pub async fn select_role_tab(&self, role: UserRole) {
        self.navigate(Route::Users(role)).await;
    }

    /// Reload the team list
    ///
    /// On the listing route the first team becomes current and its roster is
    /// listed; an empty list leaves no team selected. Cached users' team
    /// references are rebuilt from the fetched member lists.
    pub async fn fetch_teams(&self) {
        let _loading = LoadingGuard::new(&self.store);
        let generation = self.store.update(|state| state.teams_generation.issue());

        debug!(generation, "Fetching teams");

        let teams = match self.client.list_teams(&self.config.team_fields).await {
            Ok(teams) => teams,
            Err(err) => {
                self.notify_error(messages::FETCH_TEAMS_ERROR, &err);
                return;
            }
        };

        let listed = self
            .config
            .team_fields
            .contains(&TeamField::Users)
            .then(|| teams.clone());

        let selected = self.store.update(|state| {
            if !state.teams_generation.is_current(generation) {
                debug!(generation, "Discarding stale team list");
                return None;
            }

            let first = teams.first().cloned();
            state.teams = teams;

            if state.route != Route::Listing {
                return Some(false);
            }

            state.team_generation.issue();
            match first {
                Some(team) => {
                    state.select_team(team);
                    Some(true)
                }
                None => {
                    state.clear_team();
                    Some(false)
                }
            }
        });

        let Some(selected) = selected else {
            return;
        };

        if let Some(teams) = listed {
            self.sync_cached_memberships(&teams);
        }

        if selected {
            self.fetch_roster_by_cursor(None).await;
        }
    }

    /// Load a team by name into the current selection
    ///
    /// Skipped when that team is already current unless `force` is set. The
    /// matching entry of the team list is replaced with the fresh copy. A
    /// response for a team the route no longer points at is dropped.
    pub async fn refresh_current_team(&self, name: &str, force: bool) {
        let generation = self.store.update(|state| {
            let cached = state
                .current_team
                .as_ref()
                .is_some_and(|team| team.name == name);

            (force || !cached).then(|| state.team_generation.issue())
        });

        let Some(generation) = generation else {
            debug!(team = %name, "Team already current");
            return;
        };

        let _loading = LoadingGuard::new(&self.store);
        info!(team = %name, force, "Fetching team");

        let team = match self.client.get_team(name, &self.config.team_fields).await {
            Ok(team) => team,
            Err(err) => {
                self.notify_error(messages::FETCH_TEAM_ERROR, &err);
                return;
            }
        };

        let applied = self.store.update(|state| {
            if !state.team_generation.is_current(generation) {
                return None;
            }

            // Selection follows the route; a tab or another team may have been chosen meanwhile
            let routed_elsewhere = match &state.route {
                Route::Listing => false,
                Route::Team(routed) => *routed != team.name,
                Route::Users(_) => true,
            };
            if routed_elsewhere {
                return None;
            }

            if let Some(entry) = state.teams.iter_mut().find(|entry| entry.id == team.id) {
                *entry = team.clone();
            }

            state.select_team(team);
            Some(state.teams.is_empty())
        });

        let Some(needs_team_list) = applied else {
            debug!(team = %name, generation, "Discarding stale team");
            return;
        };

        if needs_team_list {
            self.fetch_teams().await;
        }

        self.fetch_roster_by_cursor(None).await;
    }

    // ---- team roster ------------------------------------------------------

    /// List the current team's roster by cursor, optionally moving a page
    pub async fn fetch_roster_by_cursor(&self, direction: Option<CursorDirection>) {
        let issued = self
            .store
            .update(|state| state.roster.fetch_by_cursor(direction));
        self.run_roster_request(issued).await;
    }

    /// Search the current team's roster and show the given 1-based page
    pub async fn fetch_roster_by_search(&self, term: &str, page: u32) {
        let issued = self
            .store
            .update(|state| state.roster.fetch_by_search(term, page));
        self.run_roster_request(issued).await;
    }

    /// Set the roster search term; an empty term returns to cursor listing
    pub async fn search_team_users(&self, term: &str) {
        let issued = self.store.update(|state| state.roster.set_search_term(term));
        self.run_roster_request(issued).await;
    }

    pub async fn paginate_team_users(&self, target: PageTarget) {
        let issued = self.store.update(|state| state.roster.paginate(target));
        self.run_roster_request(issued).await;
    }

    async fn run_roster_request(&self, issued: Option<IssuedRequest>) {
        let Some(IssuedRequest {
            generation,
            request,
        }) = issued
        else {
            return;
        };

        let (completion, context) = match request {
            RosterRequest::Cursor(query) => {
                let result = self.client.list_users(query).await;
                let completion = self
                    .store
                    .update(|state| state.roster.complete_cursor(generation, result));
                (completion, messages::FETCH_TEAM_USERS_ERROR)
            }
            RosterRequest::Search(query) => {
                let result = self.client.search_users(query).await;
                let completion = self
                    .store
                    .update(|state| state.roster.complete_search(generation, result));
                (completion, messages::SEARCH_TEAM_USERS_ERROR)
            }
        };

        match completion {
            Completion::Applied => {}
            Completion::Stale => debug!(generation, "Discarding stale roster page"),
            Completion::Failed(err) => self.notify_error(context, &err),
        }
    }

    // ---- user directory ---------------------------------------------------

    /// Filter the active role tab by display name or name
    pub fn search_users(&self, term: &str) {
        self.store.update(|state| state.users.search(term));
    }

    /// Users not yet on the current team, as references ready to add
    pub fn unique_user_candidates(&self) -> Vec<EntityReference> {
        let current = self.store.read(|state| state.current_team.clone());

        self.cached_users()
            .iter()
            .filter(|user| {
                current
                    .as_ref()
                    .is_none_or(|team| !team.has_member(user.id.as_str()))
            })
            .map(EntityReference::user)
            .collect()
    }

    /// Add a user to the current team by updating the user's memberships
    pub async fn join_current_team(&self, user_id: &UserId) {
        let Some(team) = self.store.read(|state| state.current_team.clone()) else {
            debug!(user = %user_id, "No team selected to join");
            return;
        };

        let Some(before) = self.cached_user(user_id) else {
            let err = DomainError::not_found(format!("User '{}' not found", user_id));
            self.notify_error(messages::JOIN_TEAM_ERROR, &err);
            return;
        };

        if before.belongs_to(team.id.as_str()) {
            debug!(user = %user_id, team = %team.name, "User already on team");
            return;
        }

        let mut after = before.clone();
        after.teams.push(EntityReference::team(&team));

        info!(user = %user_id, team = %team.name, "Joining team");

        match self.submit_user_patch(&before, &after).await {
            Ok(Some(_)) => {
                self.notify(Notification::success(messages::JOIN_TEAM_SUCCESS));
                self.refresh_current_team(&team.name, true).await;
            }
            Ok(None) => {}
            Err(err) => self.notify_error(messages::JOIN_TEAM_ERROR, &err),
        }
    }

    /// Persist changes to a cached user
    pub async fn update_user(&self, after: User) {
        let Some(before) = self.cached_user(&after.id) else {
            let err = DomainError::not_found(format!("User '{}' not found", after.id));
            self.notify_error(messages::UPDATE_USER_ERROR, &err);
            return;
        };

        let _loading = LoadingGuard::new(&self.store);
        info!(user = %after.id, "Updating user");

        if let Err(err) = self.submit_user_patch(&before, &after).await {
            self.notify_error(messages::UPDATE_USER_ERROR, &err);
        }
    }

    pub async fn delete_user(&self, id: &UserId) {
        let _loading = LoadingGuard::new(&self.store);
        info!(user = %id, "Deleting user");

        if let Err(err) = self.client.delete_user(id).await {
            self.notify_error(messages::DELETE_USER_ERROR, &err);
            return;
        }

        if let Err(err) = self.cache.remove(id) {
            self.notify_error(messages::DELETE_USER_ERROR, &err);
        }
        self.sync_user_filter();
    }

    /// Returns the updated user, or `None` when nothing changed
    async fn submit_user_patch(
        &self,
        before: &User,
        after: &User,
    ) -> Result<Option<User>, DomainError> {
        let ops = diff_entities(before, after)?;
        if ops.is_empty() {
            debug!(user = %before.id, "No user changes to submit");
            return Ok(None);
        }

        let updated = self.client.update_user(&before.id, ops).await?;
        self.cache.upsert(updated.clone())?;
        self.sync_user_filter();

        Ok(Some(updated))
    }

    async fn reload_user_cache(&self) {
        let loaded = async {
            self.cache.invalidate()?;
            let users = self.load_all_users().await?;
            self.cache.replace_all(users)
        }
        .await;

        if let Err(err) = loaded {
            self.notify_error(messages::FETCH_USERS_ERROR, &err);
        }
        self.sync_user_filter();
    }

    /// Walk the full user listing with `after` cursors
    async fn load_all_users(&self) -> Result<Vec<User>, DomainError> {
        let mut users = Vec::new();
        let mut query = UserListQuery::new(self.config.user_page_size);

        loop {
            let page = self.client.list_users(query).await?;
            let exhausted = page.data.is_empty();
            users.extend(page.data);

            match page.paging.after {
                Some(token) if !exhausted => {
                    query = UserListQuery::new(self.config.user_page_size)
                        .with_cursor(CursorDirection::After, token);
                }
                _ => break,
            }
        }

        debug!(count = users.len(), "Loaded user directory");
        Ok(users)
    }

    fn cached_users(&self) -> Vec<User> {
        self.cache.users().unwrap_or_else(|err| {
            warn!(error = %err, "Failed to read user cache");
            Vec::new()
        })
    }

    fn cached_user(&self, id: &UserId) -> Option<User> {
        self.cached_users().into_iter().find(|user| &user.id == id)
    }

    /// Point each cached user's `teams` at the listed teams that name them
    fn sync_cached_memberships(&self, teams: &[Team]) {
        let mut changed = 0;

        for user in self.cached_users() {
            let memberships: Vec<EntityReference> = teams
                .iter()
                .filter(|team| team.has_member(user.id.as_str()))
                .map(EntityReference::team)
                .collect();

            if memberships == user.teams {
                continue;
            }

            let updated = User {
                teams: memberships,
                ..user
            };
            if let Err(err) = self.cache.upsert(updated) {
                warn!(error = %err, "Failed to update cached memberships");
                return;
            }
            changed += 1;
        }

        if changed > 0 {
            debug!(changed, "Refreshed cached team memberships");
            self.sync_user_filter();
        }
    }

    fn sync_user_filter(&self) {
        let users = self.cached_users();
        self.store.update(|state| state.users.set_users(&users));
    }

    // ---- team mutations ---------------------------------------------------

    pub async fn add_users_to_team(&self, users: Vec<EntityReference>) {
        if let Some(team) = self.current_team() {
            let after = team.with_members_added(&users);
            self.submit_team_patch(&team, &after, messages::UPDATE_TEAM_ERROR)
                .await;
        }
        self.store.update(|state| state.flags.adding_users = false);
    }

    pub async fn remove_user_from_team(&self, user_id: &UserId) {
        if let Some(team) = self.current_team() {
            let after = team.with_member_removed(user_id.as_str());
            self.submit_team_patch(&team, &after, messages::UPDATE_TEAM_ERROR)
                .await;
        }
    }

    /// Persist an edited copy of the current team
    pub async fn update_team(&self, after: Team) {
        if let Some(team) = self.current_team() {
            self.submit_team_patch(&team, &after, messages::UPDATE_TEAM_ERROR)
                .await;
        }
    }

    /// Replace the current team's description and close the editor
    pub async fn update_description(&self, description: &str) {
        if let Some(team) = self.current_team() {
            if team.description.as_deref() == Some(description) {
                debug!(team = %team.name, "Description unchanged");
            } else {
                let after = team.clone().with_description(description);
                self.submit_team_patch(&team, &after, messages::UPDATE_TEAM_ERROR)
                    .await;
            }
        }
        self.store
            .update(|state| state.flags.description_editable = false);
    }

    /// Diff, send and re-fetch; returns whether a patch was applied
    ///
    /// The re-fetch goes by the name in the server's response so the
    /// selection reflects what the directory stored.
    async fn submit_team_patch(&self, before: &Team, after: &Team, context: &str) -> bool {
        let ops = match diff_entities(before, after) {
            Ok(ops) => ops,
            Err(err) => {
                self.notify_error(context, &err);
                return false;
            }
        };

        if ops.is_empty() {
            debug!(team = %before.name, "No team changes to submit");
            return false;
        }

        let _loading = LoadingGuard::new(&self.store);
        info!(team = %before.name, ops = ops.len(), "Patching team");

        match self.client.patch_team(&before.id, ops).await {
            Ok(updated) => {
                self.refresh_current_team(&updated.name, true).await;
                true
            }
            Err(err) => {
                self.notify_error(context, &err);
                false
            }
        }
    }

    fn current_team(&self) -> Option<Team> {
        let team = self.store.read(|state| state.current_team.clone());
        if team.is_none() {
            debug!("No team selected");
        }
        team
    }

    // ---- new team form ----------------------------------------------------

    /// Re-validate after a form edit; silent until the form is touched
    pub fn on_new_team_data_change(&self, candidate: &CreateTeamRequest) -> ValidationErrors {
        self.store.update(|state| {
            state
                .form
                .on_change(&self.validator, candidate, &state.teams)
        })
    }

    pub fn force_validate(&self, candidate: &CreateTeamRequest) -> ValidationErrors {
        self.store.update(|state| {
            state
                .form
                .force_validate(&self.validator, candidate, &state.teams)
        })
    }

    /// Validate and submit a new team; returns whether it was created
    ///
    /// On success the form closes and the team list reloads. A rejected or
    /// failed submission leaves the form open.
    pub async fn create_team(&self, candidate: CreateTeamRequest) -> bool {
        let errors = self.force_validate(&candidate);
        if !errors.is_empty() {
            info!(name = %candidate.name, errors = errors.len(), "Rejected new team");
            return false;
        }

        let request = CreateTeamRequest {
            name: candidate.name,
            display_name: candidate.display_name,
            description: candidate.description,
        };

        let _loading = LoadingGuard::new(&self.store);
        info!(name = %request.name, "Creating team");

        match self.client.create_team(request).await {
            Ok(team) => {
                debug!(id = %team.id, "Team created");
                self.store.update(|state| {
                    state.flags.adding_team = false;
                    state.form.reset();
                });
                self.fetch_teams().await;
                true
            }
            Err(err) => {
                self.notify_error(messages::CREATE_TEAM_ERROR, &err);
                false
            }
        }
    }

    /// Delete a team and move off it if it was the routed one
    pub async fn delete_team(&self, team: &Team) {
        let _loading = LoadingGuard::new(&self.store);
        info!(id = %team.id, name = %team.name, "Deleting team");

        match self.client.delete_team(&team.id).await {
            Ok(()) => {
                let routed_here = self
                    .store
                    .read(|state| state.route.team_name() == Some(team.name.as_str()));

                if routed_here {
                    self.navigate(Route::Listing).await;
                } else {
                    self.fetch_teams().await;
                }
            }
            Err(err) => self.notify_error(messages::DELETE_TEAM_ERROR, &err),
        }

        self.store.update(|state| state.flags.deleting_team = None);
    }

    // ---- presentation flags -----------------------------------------------

    /// Open or close the new-team dialog; the form starts pristine either way
    pub fn set_adding_team(&self, open: bool) {
        self.store.update(|state| {
            state.flags.adding_team = open;
            state.form.reset();
        });
    }

    pub fn set_adding_users(&self, open: bool) {
        self.store.update(|state| state.flags.adding_users = open);
    }

    pub fn set_description_editable(&self, editable: bool) {
        self.store
            .update(|state| state.flags.description_editable = editable);
    }

    /// Ask for delete confirmation of a team, or dismiss it with `None`
    pub fn set_deleting_team(&self, team: Option<Team>) {
        self.store.update(|state| state.flags.deleting_team = team);
    }

    // ---- notifications ----------------------------------------------------

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("No notification subscribers");
        }
    }

    fn notify_error(&self, message: &str, err: &DomainError) {
        warn!(error = %err, "{}", message);
        self.notify(Notification::error(message, err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::directory::{
        MockDirectoryClient, Paging, SearchHit, SearchHits, SearchResponse, SearchTotal, UserPage,
        UserSearchSource,
    };
    use crate::domain::roster::ListingMode;
    use crate::domain::team::{TeamFormField, TeamId};
    use crate::infrastructure::controller::{NotificationLevel, Selection};
    use crate::infrastructure::directory::{DirectoryFixture, InMemoryDirectoryClient};
    use crate::infrastructure::user::InMemoryUserCache;

    fn user(id: &str, name: &str) -> User {
        User::new(UserId::new(id), name)
    }

    fn fixture() -> DirectoryFixture {
        let alice = user("u1", "alice").with_display_name("Alice");
        let bob = user("u2", "bob").admin();
        let carol = user("u3", "carol").bot();
        let dave = user("u4", "dave");

        DirectoryFixture {
            teams: vec![
                Team::new("t1", "ops").with_users(vec![
                    EntityReference::user(&alice),
                    EntityReference::user(&bob),
                ]),
                Team::new("t2", "search").with_description("Search infra"),
            ],
            users: vec![alice, bob, carol, dave],
        }
    }

    fn in_memory() -> (
        Arc<InMemoryDirectoryClient>,
        DirectoryController<InMemoryDirectoryClient>,
    ) {
        let client = Arc::new(InMemoryDirectoryClient::from_fixture(fixture()));
        let controller = DirectoryController::new(
            client.clone(),
            Arc::new(InMemoryUserCache::new()),
            DirectoryConfig::default(),
        );
        (client, controller)
    }

    fn mocked(client: MockDirectoryClient) -> DirectoryController<MockDirectoryClient> {
        DirectoryController::new(
            Arc::new(client),
            Arc::new(InMemoryUserCache::new()),
            DirectoryConfig::default(),
        )
    }

    fn empty_page() -> UserPage {
        UserPage {
            data: vec![],
            paging: Paging::default(),
        }
    }

    #[tokio::test]
    async fn test_listing_selects_first_team() {
        let (_, controller) = in_memory();

        controller.navigate(Route::Listing).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.current_team.unwrap().name, "ops");
        assert_eq!(snapshot.roster.len(), 2);
        assert_eq!(snapshot.partitions.len(), 4);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_empty_team_list_leaves_no_selection() {
        let controller = DirectoryController::new(
            Arc::new(InMemoryDirectoryClient::new()),
            Arc::new(InMemoryUserCache::new()),
            DirectoryConfig::default(),
        );
        let mut notifications = controller.notifications();

        controller.navigate(Route::Listing).await;

        let snapshot = controller.snapshot();
        assert!(snapshot.teams.is_empty());
        assert_eq!(snapshot.selection(), Selection::NoTeam);
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_team_route_loads_named_team() {
        let (_, controller) = in_memory();

        controller.navigate(Route::parse(Some("search"))).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.selection(), Selection::Team);
        assert_eq!(snapshot.current_team.unwrap().name, "search");
        assert!(snapshot.roster.is_empty());
    }

    #[tokio::test]
    async fn test_role_route_clears_team_selection() {
        let (_, controller) = in_memory();
        controller.navigate(Route::Listing).await;

        controller.select_role_tab(UserRole::Bot).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.selection(), Selection::RoleTab(UserRole::Bot));
        assert!(snapshot.current_team.is_none());
        assert_eq!(snapshot.selected_users.len(), 1);
        assert_eq!(snapshot.selected_users[0].name, "carol");
    }

    #[tokio::test]
    async fn test_user_search_filters_active_tab() {
        let (_, controller) = in_memory();
        controller.select_role_tab(UserRole::Regular).await;

        controller.search_users("ALI");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.user_search_term, "ALI");
        assert_eq!(snapshot.selected_users.len(), 1);

        controller.select_role_tab(UserRole::Admin).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.user_search_term, "");
        assert_eq!(snapshot.selected_users[0].name, "bob");
    }

    #[tokio::test]
    async fn test_roster_search_and_reset() {
        let (_, controller) = in_memory();
        controller.navigate(Route::Listing).await;

        controller.search_team_users("bob").await;
        let snapshot = controller.snapshot();
        assert!(snapshot.listing_mode.is_search());
        assert_eq!(snapshot.roster.len(), 1);
        assert_eq!(snapshot.paging.total, 1);

        controller.search_team_users("").await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.listing_mode, ListingMode::default());
        assert_eq!(snapshot.roster.len(), 2);
    }

    #[tokio::test]
    async fn test_navigation_clears_roster_search() {
        let (_, controller) = in_memory();
        controller.select_team("ops").await;
        controller.search_team_users("bob").await;

        controller.select_team("ops").await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.team_users_search_term(), "");
        assert_eq!(snapshot.roster.len(), 2);
    }

    #[tokio::test]
    async fn test_patch_refetches_team_by_response_name() {
        let team = Team::new("t1", "ops");
        let mut client = MockDirectoryClient::new();

        client.expect_list_users().returning(|_| Ok(empty_page()));
        client
            .expect_list_teams()
            .returning(|_| Ok(vec![Team::new("t1", "ops")]));
        client
            .expect_patch_team()
            .times(1)
            .withf(|id, ops| id.as_str() == "t1" && ops.len() == 1)
            .returning(|_, _| Ok(Team::new("t1", "ops").with_description("Runs things")));
        client
            .expect_get_team()
            .withf(|name, _| name == "ops")
            .times(1)
            .returning(|_, _| Ok(Team::new("t1", "ops").with_description("Runs things")));

        let controller = mocked(client);
        controller.navigate(Route::Listing).await;
        assert_eq!(controller.snapshot().current_team, Some(team));

        controller.update_description("Runs things").await;

        let snapshot = controller.snapshot();
        assert_eq!(
            snapshot.current_team.unwrap().description.as_deref(),
            Some("Runs things")
        );
        assert_eq!(
            snapshot.teams[0].description.as_deref(),
            Some("Runs things")
        );
        assert!(!snapshot.flags.description_editable);
    }

    #[tokio::test]
    async fn test_unchanged_description_sends_nothing() {
        let mut client = MockDirectoryClient::new();
        client.expect_list_users().returning(|_| Ok(empty_page()));
        client
            .expect_list_teams()
            .returning(|_| Ok(vec![Team::new("t1", "ops").with_description("Same")]));
        client.expect_patch_team().never();

        let controller = mocked(client);
        controller.navigate(Route::Listing).await;
        controller.set_description_editable(true);

        controller.update_description("Same").await;

        assert!(!controller.snapshot().flags.description_editable);
    }

    #[tokio::test]
    async fn test_failed_patch_notifies_and_keeps_team() {
        let mut client = MockDirectoryClient::new();
        client.expect_list_users().returning(|_| Ok(empty_page()));
        client
            .expect_list_teams()
            .returning(|_| Ok(vec![Team::new("t1", "ops")]));
        client
            .expect_patch_team()
            .returning(|_, _| Err(DomainError::transport("connection reset")));
        client.expect_get_team().never();

        let controller = mocked(client);
        let mut notifications = controller.notifications();
        controller.navigate(Route::Listing).await;

        controller.update_description("New").await;

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.message, messages::UPDATE_TEAM_ERROR);
        assert_eq!(controller.snapshot().current_team.unwrap().description, None);
    }

    #[tokio::test]
    async fn test_fetch_teams_failure_notifies() {
        let mut client = MockDirectoryClient::new();
        client.expect_list_users().returning(|_| Ok(empty_page()));
        client
            .expect_list_teams()
            .returning(|_| Err(DomainError::unexpected_response("empty team list payload")));

        let controller = mocked(client);
        let mut notifications = controller.notifications();

        controller.navigate(Route::Listing).await;

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.message, messages::FETCH_TEAMS_ERROR);
        assert_eq!(
            notification.detail.as_deref(),
            Some("Unexpected response: empty team list payload")
        );
        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn test_search_failure_clears_roster() {
        let mut client = MockDirectoryClient::new();
        client.expect_list_users().returning(|query| {
            Ok(UserPage {
                data: if query.team.is_some() {
                    vec![User::new(UserId::new("u1"), "alice")]
                } else {
                    vec![]
                },
                paging: Paging::default(),
            })
        });
        client
            .expect_list_teams()
            .returning(|_| Ok(vec![Team::new("t1", "ops")]));
        client
            .expect_search_users()
            .returning(|_| Err(DomainError::transport("index offline")));

        let controller = mocked(client);
        let mut notifications = controller.notifications();
        controller.navigate(Route::Listing).await;
        assert_eq!(controller.snapshot().roster.len(), 1);

        controller.search_team_users("ali").await;

        let snapshot = controller.snapshot();
        assert!(snapshot.roster.is_empty());
        assert_eq!(snapshot.paging, Paging::default());
        assert_eq!(
            notifications.try_recv().unwrap().message,
            messages::SEARCH_TEAM_USERS_ERROR
        );
    }

    #[tokio::test]
    async fn test_search_paginates_by_page_number() {
        let mut client = MockDirectoryClient::new();
        client.expect_list_users().returning(|_| Ok(empty_page()));
        client
            .expect_list_teams()
            .returning(|_| Ok(vec![Team::new("t1", "ops")]));
        client
            .expect_search_users()
            .withf(|query| query.page == 1)
            .times(1)
            .returning(|_| {
                Ok(SearchResponse {
                    hits: SearchHits {
                        hits: vec![SearchHit {
                            source: UserSearchSource::from(&user("u1", "alice")),
                        }],
                        total: SearchTotal { value: 30 },
                    },
                })
            });
        client
            .expect_search_users()
            .withf(|query| query.page == 3 && query.filter == "(teams:t1)")
            .times(1)
            .returning(|_| {
                Ok(SearchResponse {
                    hits: SearchHits {
                        hits: vec![],
                        total: SearchTotal { value: 30 },
                    },
                })
            });

        let controller = mocked(client);
        controller.navigate(Route::Listing).await;
        controller.search_team_users("a").await;

        controller
            .paginate_team_users(PageTarget::Cursor(CursorDirection::After))
            .await;
        controller.paginate_team_users(PageTarget::Page(3)).await;

        assert_eq!(
            controller.snapshot().listing_mode,
            ListingMode::Search {
                term: "a".to_string(),
                page: 3
            }
        );
    }

    #[tokio::test]
    async fn test_create_team_rejects_duplicate_name() {
        let (client, controller) = in_memory();
        controller.navigate(Route::Listing).await;
        controller.set_adding_team(true);

        let created = controller
            .create_team(CreateTeamRequest::new("OPS", "Operations"))
            .await;

        assert!(!created);
        let snapshot = controller.snapshot();
        assert!(snapshot.flags.adding_team);
        assert_eq!(
            snapshot
                .validation_errors
                .unwrap()
                .get(TeamFormField::Name),
            Some("Name already exists")
        );
        assert_eq!(client.fixture().unwrap().teams.len(), 2);
    }

    #[tokio::test]
    async fn test_form_validates_only_after_touch() {
        let (_, controller) = in_memory();
        controller.navigate(Route::Listing).await;
        let candidate = CreateTeamRequest::new("", "");

        assert!(controller.on_new_team_data_change(&candidate).is_empty());
        assert_eq!(controller.force_validate(&candidate).len(), 2);

        let fixed = CreateTeamRequest::new("data-eng", "");
        let errors = controller.on_new_team_data_change(&fixed);
        assert_eq!(errors.len(), 1);
        assert!(errors.get(TeamFormField::DisplayName).is_some());
    }

    #[tokio::test]
    async fn test_create_team_failure_keeps_form_open() {
        let mut client = MockDirectoryClient::new();
        client.expect_list_users().returning(|_| Ok(empty_page()));
        client.expect_list_teams().returning(|_| Ok(vec![]));
        client
            .expect_create_team()
            .returning(|_| Err(DomainError::conflict("Team 'data-eng' already exists")));

        let controller = mocked(client);
        let mut notifications = controller.notifications();
        controller.navigate(Route::Listing).await;
        controller.set_adding_team(true);

        let created = controller
            .create_team(CreateTeamRequest::new("data-eng", "Data Engineering"))
            .await;

        assert!(!created);
        assert!(controller.snapshot().flags.adding_team);
        assert_eq!(
            notifications.try_recv().unwrap().message,
            messages::CREATE_TEAM_ERROR
        );
    }

    #[tokio::test]
    async fn test_add_and_remove_members() {
        let (client, controller) = in_memory();
        controller.navigate(Route::Listing).await;
        controller.set_adding_users(true);

        let candidates = controller.unique_user_candidates();
        let names: Vec<&str> = candidates
            .iter()
            .filter_map(|c| c.name.as_deref())
            .collect();
        assert_eq!(names, vec!["carol", "dave"]);

        controller.add_users_to_team(candidates).await;

        let snapshot = controller.snapshot();
        assert!(!snapshot.flags.adding_users);
        assert_eq!(snapshot.current_team.unwrap().users.len(), 4);
        assert_eq!(snapshot.roster.len(), 4);

        controller.remove_user_from_team(&UserId::new("u1")).await;
        let ops = client
            .fixture()
            .unwrap()
            .teams
            .into_iter()
            .find(|team| team.name == "ops")
            .unwrap();
        assert!(!ops.has_member("u1"));
        assert_eq!(controller.snapshot().roster.len(), 3);
    }

    #[tokio::test]
    async fn test_join_current_team_notifies_success() {
        let (_, controller) = in_memory();
        controller.navigate(Route::Listing).await;
        let mut notifications = controller.notifications();

        controller.join_current_team(&UserId::new("u4")).await;

        let notification = notifications.try_recv().unwrap();
        assert_eq!(notification.level, NotificationLevel::Success);
        assert_eq!(notification.message, messages::JOIN_TEAM_SUCCESS);
        assert!(controller.snapshot().current_team.unwrap().has_member("u4"));
    }

    #[tokio::test]
    async fn test_update_and_delete_user_write_cache() {
        let (_, controller) = in_memory();
        controller.select_role_tab(UserRole::Regular).await;

        let dave = user("u4", "dave").admin();
        controller.update_user(dave).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.partitions.admins.len(), 2);
        assert_eq!(snapshot.selected_users.len(), 1);

        controller.delete_user(&UserId::new("u1")).await;
        let snapshot = controller.snapshot();
        assert!(snapshot.selected_users.is_empty());
        assert_eq!(snapshot.partitions.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_routed_team_returns_to_listing() {
        let (_, controller) = in_memory();
        controller.select_team("search").await;
        let team = controller.snapshot().current_team.unwrap();
        controller.set_deleting_team(Some(team.clone()));

        controller.delete_team(&team).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.route, Route::Listing);
        assert_eq!(snapshot.teams.len(), 1);
        assert_eq!(snapshot.current_team.unwrap().name, "ops");
        assert!(snapshot.flags.deleting_team.is_none());
    }

    #[tokio::test]
    async fn test_delete_other_team_keeps_route() {
        let (_, controller) = in_memory();
        controller.select_team("ops").await;

        controller.delete_team(&Team::new(TeamId::new("t2"), "search")).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.route, Route::Team("ops".to_string()));
        assert_eq!(snapshot.teams.len(), 1);
    }

    #[tokio::test]
    async fn test_team_list_refreshes_cached_memberships() {
        let client = Arc::new(InMemoryDirectoryClient::from_fixture(fixture()));
        let cache = Arc::new(InMemoryUserCache::new());
        let controller =
            DirectoryController::new(client.clone(), cache.clone(), DirectoryConfig::default());
        controller.navigate(Route::Listing).await;

        let alice = |cache: &InMemoryUserCache| {
            cache
                .users()
                .unwrap()
                .into_iter()
                .find(|user| user.id.as_str() == "u1")
                .unwrap()
        };
        assert!(alice(&cache).belongs_to("t1"));

        client.delete_team(&TeamId::new("t1")).await.unwrap();
        controller.fetch_teams().await;

        assert!(!alice(&cache).belongs_to("t1"));
        assert!(controller
            .snapshot()
            .partitions
            .regular
            .iter()
            .all(|user| user.teams.is_empty()));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (_, controller) = in_memory();
        let mut receiver = controller.subscribe();

        controller.navigate(Route::Listing).await;

        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().teams.len(), 2);
    }
}

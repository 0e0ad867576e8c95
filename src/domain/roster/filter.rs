//! Role partitions and text filtering over the user directory

use serde::Serialize;

use crate::domain::user::{User, UserRole};

/// Users split into the three role partitions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RolePartitions {
    pub regular: Vec<User>,
    pub admins: Vec<User>,
    pub bots: Vec<User>,
}

impl RolePartitions {
    /// Partition in a single pass, keeping input order inside each partition
    pub fn from_users(users: &[User]) -> Self {
        let mut partitions = Self::default();

        for user in users {
            match user.role() {
                UserRole::Regular => partitions.regular.push(user.clone()),
                UserRole::Admin => partitions.admins.push(user.clone()),
                UserRole::Bot => partitions.bots.push(user.clone()),
            }
        }

        partitions
    }

    pub fn get(&self, role: UserRole) -> &[User] {
        match role {
            UserRole::Regular => &self.regular,
            UserRole::Admin => &self.admins,
            UserRole::Bot => &self.bots,
        }
    }

    pub fn len(&self) -> usize {
        self.regular.len() + self.admins.len() + self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Case-insensitive substring match against the user's label
pub fn matches_term(user: &User, term: &str) -> bool {
    user.label().to_lowercase().contains(&term.to_lowercase())
}

/// Role-tab view over the user directory with live text filtering
///
/// Switching tabs shows the new tab's full partition and drops the search
/// term; it is not re-applied to the new tab. With no tab selected nothing
/// is shown.
#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    partitions: RolePartitions,
    active_tab: Option<UserRole>,
    search_term: String,
    selected: Vec<User>,
}

impl RosterFilter {
    pub fn new(users: &[User], active_tab: Option<UserRole>) -> Self {
        let mut filter = Self {
            partitions: RolePartitions::from_users(users),
            active_tab,
            search_term: String::new(),
            selected: Vec::new(),
        };
        filter.refresh_selection();
        filter
    }

    /// Re-partition after the directory changed, keeping the current term
    pub fn set_users(&mut self, users: &[User]) {
        self.partitions = RolePartitions::from_users(users);
        self.refresh_selection();
    }

    /// Select a tab (or none), resetting the view to its full partition
    pub fn select_tab(&mut self, tab: Option<UserRole>) {
        self.active_tab = tab;
        self.search_term.clear();
        self.refresh_selection();
    }

    /// Filter the active tab's partition; an empty term restores it in full
    pub fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.refresh_selection();
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    pub fn selected(&self) -> &[User] {
        &self.selected
    }

    pub fn partitions(&self) -> &RolePartitions {
        &self.partitions
    }

    pub fn active_tab(&self) -> Option<UserRole> {
        self.active_tab
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    fn refresh_selection(&mut self) {
        let Some(tab) = self.active_tab else {
            self.selected.clear();
            return;
        };

        let partition = self.partitions.get(tab);

        self.selected = if self.search_term.is_empty() {
            partition.to_vec()
        } else {
            partition
                .iter()
                .filter(|user| matches_term(user, &self.search_term))
                .cloned()
                .collect()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserId;
    use std::collections::HashSet;

    fn users() -> Vec<User> {
        vec![
            User::new(UserId::new("u1"), "alice").with_display_name("Alice Smith"),
            User::new(UserId::new("u2"), "bob").admin(),
            User::new(UserId::new("u3"), "ingestion-bot").bot(),
            User::new(UserId::new("u4"), "root-bot").admin().bot(),
            User::new(UserId::new("u5"), "carol").with_display_name("Carol Jones"),
            User::new(UserId::new("u6"), "dave").with_display_name("Dave Admin").admin(),
        ]
    }

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|user| user.id.as_str()).collect()
    }

    #[test]
    fn test_partitions_cover_every_user_once() {
        let all = users();
        let partitions = RolePartitions::from_users(&all);

        assert_eq!(partitions.len(), all.len());

        let mut seen = HashSet::new();
        for role in UserRole::ALL {
            for user in partitions.get(role) {
                assert!(seen.insert(user.id.clone()), "duplicate {}", user.id);
            }
        }
        assert_eq!(seen.len(), all.len());
    }

    #[test]
    fn test_bot_takes_precedence_over_admin() {
        let partitions = RolePartitions::from_users(&users());

        assert_eq!(ids(&partitions.bots), vec!["u3", "u4"]);
        assert_eq!(ids(&partitions.admins), vec!["u2", "u6"]);
        assert_eq!(ids(&partitions.regular), vec!["u1", "u5"]);
    }

    #[test]
    fn test_no_tab_selects_nothing() {
        let mut filter = RosterFilter::new(&users(), None);
        assert!(filter.selected().is_empty());

        filter.search("a");
        assert!(filter.selected().is_empty());
    }

    #[test]
    fn test_search_matches_display_name_case_insensitively() {
        let mut filter = RosterFilter::new(&users(), Some(UserRole::Regular));

        filter.search("SMITH");
        assert_eq!(ids(filter.selected()), vec!["u1"]);

        // login name is ignored when a display name exists
        filter.search("carol");
        assert_eq!(ids(filter.selected()), vec!["u5"]);
        filter.search("alice s");
        assert_eq!(ids(filter.selected()), vec!["u1"]);
    }

    #[test]
    fn test_search_falls_back_to_name() {
        let mut filter = RosterFilter::new(&users(), Some(UserRole::Admin));

        filter.search("bo");
        assert_eq!(ids(filter.selected()), vec!["u2"]);
    }

    #[test]
    fn test_clearing_term_restores_partition() {
        let mut filter = RosterFilter::new(&users(), Some(UserRole::Admin));

        filter.search("dave");
        assert_eq!(filter.selected().len(), 1);

        filter.clear_search();
        assert_eq!(ids(filter.selected()), vec!["u2", "u6"]);
    }

    #[test]
    fn test_switching_tab_drops_term() {
        let mut filter = RosterFilter::new(&users(), Some(UserRole::Regular));
        filter.search("alice");

        filter.select_tab(Some(UserRole::Bot));

        assert_eq!(filter.search_term(), "");
        assert_eq!(ids(filter.selected()), vec!["u3", "u4"]);
    }

    #[test]
    fn test_set_users_keeps_term() {
        let mut filter = RosterFilter::new(&users(), Some(UserRole::Regular));
        filter.search("jones");

        let mut updated = users();
        updated.push(User::new(UserId::new("u7"), "eve").with_display_name("Eve Jones"));
        filter.set_users(&updated);

        assert_eq!(ids(filter.selected()), vec!["u5", "u7"]);
    }
}

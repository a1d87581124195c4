//! User and group records.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the group whose members bypass every permission check.
pub const GLOBAL_ADMINS: &str = "globalAdmins";

/// A chat platform account known to the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Platform user id (e.g. "U024BE7LH").
    pub id: String,
    /// When the bot first saw this user.
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A named permission bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    /// Ids of member users.
    pub members: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Check whether the given user id belongs to this group.
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }
}

/// Users and groups with their many-to-many membership.
///
/// Membership is stored on the group side; a user's groups are derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directory {
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user with this id, creating it if needed.
    ///
    /// The boolean is true when the user was created by this call.
    pub fn find_or_create_user(&mut self, id: &str) -> (User, bool) {
        if let Some(user) = self.users.get(id) {
            return (user.clone(), false);
        }
        let user = User::new(id);
        self.users.insert(id.to_string(), user.clone());
        (user, true)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    /// Groups the user belongs to, ordered by name.
    pub fn groups_of(&self, user_id: &str) -> Vec<Group> {
        self.groups
            .values()
            .filter(|g| g.has_member(user_id))
            .cloned()
            .collect()
    }

    /// Return the group with this name, creating it if needed.
    pub fn find_or_create_group(&mut self, name: &str) -> (Group, bool) {
        if let Some(group) = self.groups.get(name) {
            return (group.clone(), false);
        }
        let group = Group::new(name);
        self.groups.insert(name.to_string(), group.clone());
        (group, true)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// All groups, ordered by name.
    pub fn groups(&self) -> Vec<Group> {
        self.groups.values().cloned().collect()
    }

    /// Members of a group, ordered by user id.
    pub fn members_of(&self, group: &str) -> Result<Vec<User>, StoreError> {
        let group = self
            .groups
            .get(group)
            .ok_or_else(|| StoreError::GroupNotFound(group.to_string()))?;

        Ok(group
            .members
            .iter()
            .filter_map(|id| self.users.get(id))
            .cloned()
            .collect())
    }

    /// Add a user to a group, creating either one lazily.
    ///
    /// Returns true if the directory changed.
    pub fn add_member(&mut self, group: &str, user_id: &str) -> bool {
        let (_, user_created) = self.find_or_create_user(user_id);
        let (_, group_created) = self.find_or_create_group(group);
        let added = self
            .groups
            .get_mut(group)
            .map(|g| g.members.insert(user_id.to_string()))
            .unwrap_or(false);

        user_created || group_created || added
    }

    /// Remove a user from a group.
    ///
    /// Returns false if the user was not a member.
    pub fn remove_member(&mut self, group: &str, user_id: &str) -> Result<bool, StoreError> {
        let group = self
            .groups
            .get_mut(group)
            .ok_or_else(|| StoreError::GroupNotFound(group.to_string()))?;

        Ok(group.members.remove(user_id))
    }

    /// Replace a group's members, creating the group and users as needed.
    pub fn replace_members(&mut self, group: &str, user_ids: &[String]) {
        for id in user_ids {
            self.find_or_create_user(id);
        }
        self.find_or_create_group(group);
        if let Some(g) = self.groups.get_mut(group) {
            g.members = user_ids.iter().cloned().collect();
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

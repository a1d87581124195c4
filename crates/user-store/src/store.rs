//! The user store interface and its in-memory implementation.

use crate::error::StoreError;
use crate::types::{Directory, Group, User};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Persistence boundary for users, groups and their membership.
///
/// Consistency is the implementation's concern; callers hold no locks
/// across calls.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Return the user with this id, creating it on first contact.
    async fn find_or_create_user(&self, id: &str) -> Result<User, StoreError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Groups the user is a member of.
    async fn groups_of(&self, user: &User) -> Result<Vec<Group>, StoreError>;

    async fn find_or_create_group(&self, name: &str) -> Result<Group, StoreError>;

    async fn find_group(&self, name: &str) -> Result<Option<Group>, StoreError>;

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    async fn members_of(&self, group: &str) -> Result<Vec<User>, StoreError>;

    /// Add a user to a group, creating either one if needed.
    async fn add_member(&self, group: &str, user_id: &str) -> Result<(), StoreError>;

    /// Remove a user from an existing group.
    ///
    /// Returns false if the user was not a member.
    async fn remove_member(&self, group: &str, user_id: &str) -> Result<bool, StoreError>;

    /// Replace the whole member list of a group.
    async fn replace_members(&self, group: &str, user_ids: &[String]) -> Result<(), StoreError>;
}

/// In-memory user store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    directory: Arc<RwLock<Directory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a directory.
    pub fn with_directory(directory: Directory) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
        }
    }

    /// Snapshot of the current directory.
    pub async fn snapshot(&self) -> Directory {
        self.directory.read().await.clone()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    #[instrument(skip(self))]
    async fn find_or_create_user(&self, id: &str) -> Result<User, StoreError> {
        if let Some(user) = self.directory.read().await.user(id) {
            return Ok(user.clone());
        }

        let (user, created) = self.directory.write().await.find_or_create_user(id);
        if created {
            debug!("Created user {}", id);
        }
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.directory.read().await.user(id).cloned())
    }

    async fn groups_of(&self, user: &User) -> Result<Vec<Group>, StoreError> {
        Ok(self.directory.read().await.groups_of(&user.id))
    }

    async fn find_or_create_group(&self, name: &str) -> Result<Group, StoreError> {
        Ok(self.directory.write().await.find_or_create_group(name).0)
    }

    async fn find_group(&self, name: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.directory.read().await.group(name).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.directory.read().await.groups())
    }

    async fn members_of(&self, group: &str) -> Result<Vec<User>, StoreError> {
        self.directory.read().await.members_of(group)
    }

    #[instrument(skip(self))]
    async fn add_member(&self, group: &str, user_id: &str) -> Result<(), StoreError> {
        self.directory.write().await.add_member(group, user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, group: &str, user_id: &str) -> Result<bool, StoreError> {
        self.directory.write().await.remove_member(group, user_id)
    }

    #[instrument(skip(self, user_ids), fields(count = user_ids.len()))]
    async fn replace_members(&self, group: &str, user_ids: &[String]) -> Result<(), StoreError> {
        self.directory.write().await.replace_members(group, user_ids);
        Ok(())
    }
}

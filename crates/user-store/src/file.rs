//! JSON-file backed user store.

use crate::error::StoreError;
use crate::store::UserStore;
use crate::types::{Directory, Group, User};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// User store that keeps the directory in memory and rewrites a JSON file
/// after every change.
pub struct FileStore {
    directory: RwLock<Directory>,
    path: PathBuf,
}

impl FileStore {
    /// Open the store, loading the file if it exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let directory = load(&path).await?;

        Ok(Self {
            directory: RwLock::new(directory),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the directory atomically using temp file + rename.
    async fn save(&self, directory: &Directory) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(directory)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved directory ({} bytes) to {:?}", data.len(), self.path);
        Ok(())
    }

    /// Apply `change` to a copy of the directory and keep the copy only once
    /// it is on disk. `change` reports whether anything changed.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut Directory) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let mut directory = self.directory.write().await;
        let mut next = directory.clone();
        let (value, changed) = change(&mut next)?;
        if changed {
            self.save(&next).await?;
            *directory = next;
        }
        Ok(value)
    }
}

async fn load(path: &Path) -> Result<Directory, StoreError> {
    if !fs::try_exists(path).await? {
        info!("User store not found at {:?}, starting empty", path);
        return Ok(Directory::new());
    }

    let data = fs::read(path).await?;
    if data.is_empty() {
        warn!("User store at {:?} is empty, starting empty", path);
        return Ok(Directory::new());
    }

    let directory: Directory = serde_json::from_slice(&data)?;
    info!(
        "Loaded {} users and {} groups from {:?}",
        directory.user_count(),
        directory.group_count(),
        path
    );
    Ok(directory)
}

#[async_trait]
impl UserStore for FileStore {
    #[instrument(skip(self))]
    async fn find_or_create_user(&self, id: &str) -> Result<User, StoreError> {
        if let Some(user) = self.directory.read().await.user(id) {
            return Ok(user.clone());
        }

        self.update(|directory| Ok(directory.find_or_create_user(id)))
            .await
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.directory.read().await.user(id).cloned())
    }

    async fn groups_of(&self, user: &User) -> Result<Vec<Group>, StoreError> {
        Ok(self.directory.read().await.groups_of(&user.id))
    }

    async fn find_or_create_group(&self, name: &str) -> Result<Group, StoreError> {
        self.update(|directory| Ok(directory.find_or_create_group(name)))
            .await
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
        self.update(|directory| Ok(((), directory.add_member(group, user_id))))
            .await
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, group: &str, user_id: &str) -> Result<bool, StoreError> {
        self.update(|directory| {
            let removed = directory.remove_member(group, user_id)?;
            Ok((removed, removed))
        })
        .await
    }

    #[instrument(skip(self, user_ids), fields(count = user_ids.len()))]
    async fn replace_members(&self, group: &str, user_ids: &[String]) -> Result<(), StoreError> {
        self.update(|directory| {
            directory.replace_members(group, user_ids);
            Ok(((), true))
        })
        .await
    }
}

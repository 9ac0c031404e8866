//! In-process [`UserStore`] for tests and `--in-memory` runs.
//!
//! Both indexes sit behind one lock, so the username check and the insert in
//! `create_user` happen as one step, as do the version compare and write in
//! the update methods.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{StoreError, UserStore};
use crate::models::auth::User;

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<Uuid, User>,
    id_by_username: HashMap<String, Uuid>,
}

impl Inner {
    /// The user `id`, if it is still at `expected_version`.
    fn current_mut(&mut self, id: Uuid, expected_version: Uuid) -> Result<&mut User, StoreError> {
        self.by_id
            .get_mut(&id)
            .filter(|user| user.token_version == expected_version)
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.id_by_username.contains_key(username) {
            return Err(StoreError::UniqueViolation);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            token_version: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        inner.id_by_username.insert(user.username.clone(), user.id);
        inner.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .id_by_username
            .get(username)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn update_token_version(
        &self,
        id: Uuid,
        expected_version: Uuid,
        new_version: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.current_mut(id, expected_version)?;
        user.token_version = new_version;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password_and_version(
        &self,
        id: Uuid,
        expected_version: Uuid,
        new_hash: &str,
        new_version: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.current_mut(id, expected_version)?;
        user.password_hash = new_hash.to_string();
        user.token_version = new_version;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_identity_and_version() {
        let store = MemoryUserStore::new();
        let user = store.create_user("alice", "hash").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.id, user.token_version);
        assert_eq!(user.created_at, user.updated_at);

        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_id, user);
        assert_eq!(by_name, user);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let store = MemoryUserStore::new();
        store.create_user("alice", "hash").await.unwrap();
        let err = store.create_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create_user("alice", "hash").await.unwrap();
        store.create_user("Alice", "hash").await.unwrap();
        assert!(store.find_by_username("ALICE").await.unwrap().is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn failed_create_leaves_indexes_consistent() {
        let store = MemoryUserStore::new();
        let alice = store.create_user("alice", "hash").await.unwrap();
        assert!(store.create_user("alice", "other").await.is_err());

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name, alice);
        assert_eq!(by_name.password_hash, "hash");

        let bob = store.create_user("bobby", "hash").await.unwrap();
        assert_eq!(store.find_by_username("bobby").await.unwrap(), Some(bob));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn update_token_version_bumps_updated_at() {
        let store = MemoryUserStore::new();
        let user = store.create_user("alice", "hash").await.unwrap();
        let version = Uuid::new_v4();
        store
            .update_token_version(user.id, user.token_version, version)
            .await
            .unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.token_version, version);
        assert_eq!(stored.password_hash, "hash");
        assert!(stored.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn update_password_and_version_changes_both() {
        let store = MemoryUserStore::new();
        let user = store.create_user("alice", "hash").await.unwrap();
        let version = Uuid::new_v4();
        store
            .update_password_and_version(user.id, user.token_version, "new-hash", version)
            .await
            .unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert_eq!(stored.token_version, version);
    }

    #[tokio::test]
    async fn stale_expected_version_changes_nothing() {
        let store = MemoryUserStore::new();
        let user = store.create_user("alice", "hash").await.unwrap();
        let rotated = Uuid::new_v4();
        store
            .update_token_version(user.id, user.token_version, rotated)
            .await
            .unwrap();

        assert!(matches!(
            store
                .update_token_version(user.id, user.token_version, Uuid::new_v4())
                .await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store
                .update_password_and_version(user.id, user.token_version, "new-hash", Uuid::new_v4())
                .await,
            Err(StoreError::NotFound)
        ));

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.token_version, rotated);
        assert_eq!(stored.password_hash, "hash");
    }

    #[tokio::test]
    async fn updates_on_missing_user_are_not_found() {
        let store = MemoryUserStore::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            store
                .update_token_version(missing, Uuid::new_v4(), Uuid::new_v4())
                .await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store
                .update_password_and_version(missing, Uuid::new_v4(), "hash", Uuid::new_v4())
                .await,
            Err(StoreError::NotFound)
        ));
    }
}

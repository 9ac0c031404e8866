//! User store boundary.
//!
//! The auth service only talks to persistence through [`UserStore`]. Every
//! method is a single atomic unit: uniqueness is enforced by `create_user`
//! itself, and both update methods compare the current `token_version` and
//! change all their fields or none.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::User;

/// Errors reported by a [`UserStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken")]
    UniqueViolation,

    /// No user with that id, or its `token_version` no longer matches.
    #[error("user not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. The store assigns `id`, the initial `token_version` and
    /// both timestamps. A taken username yields [`StoreError::UniqueViolation`].
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-sensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Replace `token_version` and bump `updated_at`, but only while the
    /// stored version is still `expected_version`. A missing user or a version
    /// that has already moved on yields [`StoreError::NotFound`].
    async fn update_token_version(
        &self,
        id: Uuid,
        expected_version: Uuid,
        new_version: Uuid,
    ) -> Result<(), StoreError>;

    /// Replace `password_hash` and `token_version` together and bump
    /// `updated_at`, under the same `expected_version` compare as
    /// [`UserStore::update_token_version`].
    async fn update_password_and_version(
        &self,
        id: Uuid,
        expected_version: Uuid,
        new_hash: &str,
        new_version: Uuid,
    ) -> Result<(), StoreError>;
}

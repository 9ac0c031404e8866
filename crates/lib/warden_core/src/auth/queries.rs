//! PostgreSQL-backed [`UserStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{StoreError, UserStore};
use crate::models::auth::User;

const USER_COLUMNS: &str = "id, username, password_hash, token_version, created_at, updated_at";

type UserRow = (Uuid, String, String, Uuid, DateTime<Utc>, DateTime<Utc>);

fn user_from_row(row: UserRow) -> User {
    let (id, username, password_hash, token_version, created_at, updated_at) = row;
    User {
        id,
        username,
        password_hash,
        token_version,
        created_at,
        updated_at,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// User store on the `users` table created by [`crate::migrate`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        // The UNIQUE index on `username` is what rejects concurrent duplicates.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user_from_row(row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn update_token_version(
        &self,
        id: Uuid,
        expected_version: Uuid,
        new_version: Uuid,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET token_version = $3, updated_at = now() \
             WHERE id = $1 AND token_version = $2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(new_version)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_password_and_version(
        &self,
        id: Uuid,
        expected_version: Uuid,
        new_hash: &str,
        new_version: Uuid,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $3, token_version = $4, updated_at = now() \
             WHERE id = $1 AND token_version = $2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(new_hash)
        .bind(new_version)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

//! Authentication domain models.
//!
//! These are internal domain models, distinct from the HTTP wire models in
//! `warden_api::models`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain user as persisted by a [`UserStore`](crate::auth::store::UserStore).
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// bcrypt digest. Never serialized, redacted from `Debug`.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Rotating revocation marker. Every valid token carries this value.
    pub token_version: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("token_version", &self.token_version)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Closed set of token kinds. Serialized as `"access"` / `"refresh"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims embedded in access and refresh tokens.
///
/// Field names are the wire contract:
/// `{ subject, version, kind, issued_at, expires_at }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID.
    pub subject: Uuid,
    /// `token_version` of the user at issuance time.
    pub version: Uuid,
    pub kind: TokenKind,
    /// Issued at (unix timestamp, seconds).
    pub issued_at: i64,
    /// Expiry (unix timestamp, seconds).
    pub expires_at: i64,
}

/// Tokens returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Token returned by refresh. The refresh token itself is not reissued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Token type advertised to clients.
pub const BEARER: &str = "bearer";

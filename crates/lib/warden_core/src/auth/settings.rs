//! Auth configuration and JWT secret resolution.

use std::path::PathBuf;

use chrono::Duration;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use super::AuthError;
use super::jwt::TokenCodec;
use super::password::{DEFAULT_BCRYPT_COST, PasswordHasher};

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Default refresh token lifetime in days.
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;

/// Settings for token issuance and password hashing.
#[derive(Clone)]
pub struct AuthSettings {
    /// HS256 signing secret.
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthSettings {
    /// Reads settings from environment variables.
    ///
    /// | Variable                      | Default                          |
    /// |-------------------------------|----------------------------------|
    /// | `JWT_SECRET` / `AUTH_SECRET`  | generated & persisted to file    |
    /// | `ACCESS_TOKEN_EXPIRE_MINUTES` | `30`                             |
    /// | `REFRESH_TOKEN_EXPIRE_DAYS`   | `7`                              |
    /// | `BCRYPT_COST`                 | `12`                             |
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthSettings::from_env`] with an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = ["JWT_SECRET", "AUTH_SECRET"]
            .into_iter()
            .filter_map(&var)
            .find(|s| !s.is_empty())
            .unwrap_or_else(persisted_jwt_secret);

        let access_minutes = parse_var(&var, "ACCESS_TOKEN_EXPIRE_MINUTES")?
            .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES);
        let refresh_days = parse_var(&var, "REFRESH_TOKEN_EXPIRE_DAYS")?
            .unwrap_or(DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS);
        let bcrypt_cost = parse_var(&var, "BCRYPT_COST")?.unwrap_or(DEFAULT_BCRYPT_COST);

        let access_token_ttl = Duration::try_minutes(access_minutes).ok_or_else(|| {
            AuthError::Config(format!("ACCESS_TOKEN_EXPIRE_MINUTES out of range: {access_minutes}"))
        })?;
        let refresh_token_ttl = Duration::try_days(refresh_days).ok_or_else(|| {
            AuthError::Config(format!("REFRESH_TOKEN_EXPIRE_DAYS out of range: {refresh_days}"))
        })?;

        let settings = Self {
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            bcrypt_cost,
        };
        // Surface a bad secret, TTL or cost at load time rather than first use.
        settings.codec()?;
        settings.hasher()?;
        Ok(settings)
    }

    pub fn codec(&self) -> Result<TokenCodec, AuthError> {
        TokenCodec::new(
            self.jwt_secret.as_bytes(),
            self.access_token_ttl,
            self.refresh_token_ttl,
        )
    }

    pub fn hasher(&self) -> Result<PasswordHasher, AuthError> {
        PasswordHasher::new(self.bcrypt_cost)
    }
}

fn parse_var<F, T>(var: &F, key: &str) -> Result<Option<T>, AuthError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AuthError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

/// Read the persisted JWT secret, generating and storing one when absent.
fn persisted_jwt_secret() -> String {
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(&secret_path, &secret) {
        Ok(()) => info!(path = %secret_path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %secret_path.display(),
            error = %e,
            "could not persist generated JWT secret; tokens will not survive a restart"
        ),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("warden")
        .join("jwt-secret")
}

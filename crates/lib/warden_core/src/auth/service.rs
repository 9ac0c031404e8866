//! Authentication service: register, login, refresh, logout-all and
//! change-password on top of a [`UserStore`].

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::AuthError;
use super::jwt::TokenCodec;
use super::password::PasswordHasher;
use super::settings::AuthSettings;
use super::store::{StoreError, UserStore};
use super::validator::TokenValidator;
use crate::models::auth::{AccessToken, BEARER, TokenKind, TokenPair, User};

/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 4;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt ignores input past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password verified when the username is unknown, so both login failures
/// cost one bcrypt verification.
const DUMMY_PASSWORD: &str = "warden-dummy-password";

/// Validate username rules: non-empty, at least 4 characters, no whitespace.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::Validation("Username cannot be empty".into()));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::Validation("Username cannot contain whitespace".into()));
    }
    Ok(())
}

/// Validate password rules: non-empty, at least 8 characters, at most 72 bytes.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::Validation("Password cannot be empty".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Orchestrates the password hasher, token codec and user store.
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    validator: TokenValidator,
    dummy_hash: Arc<str>,
}

impl AuthService {
    /// Build a service from its parts.
    ///
    /// Computes one bcrypt hash up front for the unknown-user login path.
    pub fn new(
        store: Arc<dyn UserStore>,
        codec: TokenCodec,
        hasher: PasswordHasher,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            validator: TokenValidator::new(store.clone(), codec),
            store,
            hasher,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn from_settings(
        store: Arc<dyn UserStore>,
        settings: &AuthSettings,
    ) -> Result<Self, AuthError> {
        Self::new(store, settings.codec()?, settings.hasher()?)
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Access token lifetime in seconds, as reported in `expires_in`.
    pub fn access_token_expires_in(&self) -> i64 {
        self.codec().ttl(TokenKind::Access).num_seconds()
    }

    fn codec(&self) -> &TokenCodec {
        self.validator.codec()
    }

    // -----------------------------------------------------------------------
    // Token issuance
    // -----------------------------------------------------------------------

    fn issue_access_token(&self, user: &User) -> Result<AccessToken, AuthError> {
        let (access_token, _) = self
            .codec()
            .encode(user.id, user.token_version, TokenKind::Access)?;
        Ok(AccessToken {
            access_token,
            token_type: BEARER.to_string(),
            expires_in: self.access_token_expires_in(),
        })
    }

    fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self.issue_access_token(user)?;
        let (refresh_token, _) = self
            .codec()
            .encode(user.id, user.token_version, TokenKind::Refresh)?;
        Ok(TokenPair {
            access_token: access.access_token,
            refresh_token,
            token_type: access.token_type,
            expires_in: access.expires_in,
        })
    }

    // -----------------------------------------------------------------------
    // Blocking-pool hashing
    // -----------------------------------------------------------------------

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    }

    async fn verify_password(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher;
        let password = password.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Gate for protected operations. See [`TokenValidator::authorize`].
    pub async fn authorize(&self, token: &str, required: TokenKind) -> Result<User, AuthError> {
        self.validator.authorize(token, required).await
    }

    /// Create an account and issue its first token pair.
    pub async fn register(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        validate_username(username)?;
        validate_password(password)?;

        let password_hash = self.hash_password(password).await?;

        // No existence pre-check: the store's atomic insert decides.
        let user = match self.store.create_user(username, &password_hash).await {
            Ok(user) => user,
            Err(StoreError::UniqueViolation) => {
                debug!(username, "registration rejected: username taken");
                return Err(AuthError::UserAlreadyExists(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, username, "user registered");
        self.issue_token_pair(&user)
    }

    /// Exchange username and password for a token pair.
    ///
    /// Unknown user and wrong password are the same
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        if username.is_empty() {
            return Err(AuthError::Validation("Username cannot be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password cannot be empty".into()));
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            let _ = self.verify_password(password, &self.dummy_hash).await?;
            debug!(username, "login rejected: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(user_id = %user.id, "user logged in");
        self.issue_token_pair(&user)
    }

    /// Mint a new access token from a refresh token.
    ///
    /// The refresh token is not rotated; it stays usable until it expires or
    /// the user's version rotates.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let user = self.authorize(refresh_token, TokenKind::Refresh).await?;
        self.issue_access_token(&user)
    }

    /// Invalidate every token issued so far for `user`.
    ///
    /// `user` must carry the current `token_version`. If the version has
    /// already moved on, nothing is written and the result is
    /// [`AuthError::TokenInvalid`].
    pub async fn rotate_token_version(&self, user: &User) -> Result<(), AuthError> {
        let new_version = Uuid::new_v4();
        match self
            .store
            .update_token_version(user.id, user.token_version, new_version)
            .await
        {
            Ok(()) => {
                info!(user_id = %user.id, "token version rotated");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AuthError::TokenInvalid),
            Err(e) => Err(e.into()),
        }
    }

    /// Log the token's owner out everywhere.
    pub async fn logout_all(&self, access_token: &str) -> Result<(), AuthError> {
        let user = self.authorize(access_token, TokenKind::Access).await?;
        self.rotate_token_version(&user).await
    }

    /// Replace the password and rotate the token version in one update.
    ///
    /// The update only applies while the version the token was checked
    /// against is still current, so a logout-all or another password change
    /// that lands during hashing wins and this call fails with
    /// [`AuthError::TokenInvalid`].
    pub async fn change_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.authorize(access_token, TokenKind::Access).await?;

        if !self
            .verify_password(current_password, &user.password_hash)
            .await?
        {
            debug!(user_id = %user.id, "password change rejected: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        validate_password(new_password)?;
        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must differ from current password".into(),
            ));
        }

        let new_hash = self.hash_password(new_password).await?;
        match self
            .store
            .update_password_and_version(user.id, user.token_version, &new_hash, Uuid::new_v4())
            .await
        {
            Ok(()) => {
                info!(user_id = %user.id, "password changed");
                Ok(())
            }
            Err(StoreError::NotFound) => {
                debug!(user_id = %user.id, "password change rejected: token version moved on");
                Err(AuthError::TokenInvalid)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("abcd").is_ok());
        assert!(validate_username("名前です").is_ok());
        for bad in ["", "abc", "ali ce", "alice\t", "\nalice"] {
            assert!(
                matches!(validate_username(bad), Err(AuthError::Validation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_BYTES)).is_ok());
        for bad in [String::new(), "1234567".to_string(), "x".repeat(MAX_PASSWORD_BYTES + 1)] {
            assert!(
                matches!(validate_password(&bad), Err(AuthError::Validation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn password_length_counts_characters() {
        // Eight characters, more than eight bytes.
        assert!(validate_password("пароль12").is_ok());
        // Seven characters, more than eight bytes.
        assert!(validate_password("пароль1").is_err());
    }
}

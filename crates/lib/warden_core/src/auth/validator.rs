//! Per-request token gate.

use std::sync::Arc;

use tracing::debug;

use super::AuthError;
use super::jwt::TokenCodec;
use super::store::UserStore;
use crate::models::auth::{TokenKind, User};

/// Turns a bearer token into the user it belongs to.
///
/// All four checks (signature and expiry, kind, subject, version) must pass;
/// any failure is [`AuthError::TokenInvalid`]. The user is re-read from the
/// store on every call, so a rotated `token_version` takes effect immediately.
#[derive(Clone)]
pub struct TokenValidator {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
}

impl TokenValidator {
    pub fn new(store: Arc<dyn UserStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub async fn authorize(&self, token: &str, required: TokenKind) -> Result<User, AuthError> {
        let claims = self.codec.decode(token)?;

        if claims.kind != required {
            debug!(
                subject = %claims.subject,
                kind = %claims.kind,
                required = %required,
                "token rejected: kind mismatch"
            );
            return Err(AuthError::TokenInvalid);
        }

        let Some(user) = self.store.find_by_id(claims.subject).await? else {
            debug!(subject = %claims.subject, "token rejected: unknown subject");
            return Err(AuthError::TokenInvalid);
        };

        if user.token_version != claims.version {
            debug!(user_id = %user.id, "token rejected: version mismatch");
            return Err(AuthError::TokenInvalid);
        }

        Ok(user)
    }
}

//! Authentication and token lifecycle.
//!
//! Password hashing, JWT encoding, the user store boundary and the
//! orchestration on top of them. Shared by every `warden_api` handler.

pub mod jwt;
pub mod memory;
pub mod password;
pub mod queries;
pub mod service;
pub mod settings;
pub mod store;
pub mod validator;

use thiserror::Error;

use self::store::StoreError;

/// Authentication errors.
///
/// `InvalidCredentials` and `TokenInvalid` never carry detail: the reason a
/// credential or token was rejected stays in the local logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid authentication credentials")]
    TokenInvalid,

    #[error("User store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            // Callers that can meet these map them before `?`; reaching here
            // means the store broke its contract.
            StoreError::UniqueViolation => {
                AuthError::Internal("unexpected uniqueness violation".into())
            }
            StoreError::NotFound => AuthError::Internal("unexpected missing user".into()),
        }
    }
}

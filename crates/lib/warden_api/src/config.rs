//! API server configuration.

use warden_core::auth::settings::AuthSettings;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Token and password-hashing settings, see [`AuthSettings::from_env`].
    pub auth: AuthSettings,
}

//! # warden_core
//!
//! Core authentication and token-lifecycle logic for Warden.

pub mod auth;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Authentication request handlers.
//!
//! Thin bindings: every decision is made by [`warden_core::auth::service::AuthService`].

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use warden_core::models::auth::{AccessToken, TokenPair};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::BearerToken;
use crate::models::{ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest};

/// `POST /auth/register` — create an account and return its first token pair.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state.auth.register(&body.username, &body.password).await?;
    Ok(Json(pair))
}

/// `POST /auth/login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(pair))
}

/// `POST /auth/refresh` — exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AccessToken>> {
    let token = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(token))
}

/// `POST /auth/logout-all` — invalidate every token of the caller.
pub async fn logout_all_handler(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<StatusCode> {
    state.auth.logout_all(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/change-password` — set a new password and invalidate existing tokens.
pub async fn change_password_handler(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .auth
        .change_password(&token, &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

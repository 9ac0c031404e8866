//! Current-user endpoint.

use axum::{Extension, Json};

use crate::middleware::auth::AuthenticatedUser;
use crate::models::MeResponse;

/// `GET /me` — the user behind the access token.
pub async fn me_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<MeResponse> {
    Json(user.into())
}

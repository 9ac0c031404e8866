//! Authentication middleware — Bearer token extraction and the access-token gate.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;
use warden_core::models::auth::{TokenKind, User};

use crate::AppState;
use crate::error::AppError;

/// Key used to store the authenticated [`User`] in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Raw token from an `Authorization: Bearer <token>` header.
///
/// Extraction only parses the header; the token is not checked until it is
/// handed to the auth service.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Parse the header value. The scheme is matched case-insensitively.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            debug!("no authorization header");
            return Err(AppError::invalid_token());
        };
        let token = header.to_str().ok().and_then(parse_bearer).ok_or_else(|| {
            debug!("authorization header is not a bearer token");
            AppError::invalid_token()
        })?;
        Ok(BearerToken(token.to_string()))
    }
}

/// Axum middleware: requires a valid access token and injects
/// [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = state.auth.authorize(&token, TokenKind::Access).await?;
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_scheme() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("BEARER  abc "), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer   "), None);
        assert_eq!(parse_bearer("abc.def.ghi"), None);
    }
}

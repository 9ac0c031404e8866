//! JWT token encoding and decoding.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind};

/// Minimum accepted signing secret length, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signs and verifies HS256 tokens carrying [`TokenClaims`].
///
/// The codec knows nothing about users: it only checks signature, shape and
/// expiry. Kind and version checks belong to the validator.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Build a codec. Fails when the secret is shorter than [`MIN_SECRET_LEN`],
    /// a TTL is not positive or a TTL pushes expiry past the representable range.
    pub fn new(
        secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            return Err(AuthError::Config("token lifetimes must be positive".into()));
        }
        let now = Utc::now();
        for (name, ttl) in [("access", access_ttl), ("refresh", refresh_ttl)] {
            if now.checked_add_signed(ttl).is_none() {
                return Err(AuthError::Config(format!(
                    "{name} token lifetime is out of range: {ttl}"
                )));
            }
        }

        // Expiry lives in `expires_at`, not the registered `exp` claim, so the
        // library's own time checks are off and `decode` does them instead.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        })
    }

    /// Lifetime of tokens of the given kind.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issue a token of `kind` for `subject` at `version`, stamped with the
    /// current time. Returns the token and the claims it carries.
    pub fn encode(
        &self,
        subject: Uuid,
        version: Uuid,
        kind: TokenKind,
    ) -> Result<(String, TokenClaims), AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl(kind))
            .ok_or_else(|| AuthError::Internal(format!("{kind} token expiry overflows")))?;
        let claims = TokenClaims {
            subject,
            version,
            kind,
            issued_at: now.timestamp(),
            expires_at: expires_at.timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Verify the signature, then the expiry against the server clock.
    ///
    /// Every failure collapses into [`AuthError::TokenInvalid`].
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected: undecodable");
                AuthError::TokenInvalid
            })?
            .claims;

        let now = Utc::now().timestamp();
        if now >= claims.expires_at {
            debug!(
                subject = %claims.subject,
                expires_at = claims.expires_at,
                "token rejected: expired"
            );
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }

    pub(crate) fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(30), Duration::days(7)).unwrap()
    }

    #[test]
    fn decode_returns_encoded_claims() {
        let codec = codec();
        let (token, claims) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), TokenKind::Access)
            .unwrap();
        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn expiry_follows_kind_ttl() {
        let codec = codec();
        let (_, access) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), TokenKind::Access)
            .unwrap();
        let (_, refresh) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), TokenKind::Refresh)
            .unwrap();
        assert_eq!(access.expires_at - access.issued_at, 30 * 60);
        assert_eq!(refresh.expires_at - refresh.issued_at, 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_invalid() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            subject: Uuid::new_v4(),
            version: Uuid::new_v4(),
            kind: TokenKind::Access,
            issued_at: now - 120,
            expires_at: now - 60,
        };
        let token = codec.sign(&claims).unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn token_expiring_now_is_invalid() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            subject: Uuid::new_v4(),
            version: Uuid::new_v4(),
            kind: TokenKind::Access,
            issued_at: now - 60,
            expires_at: now,
        };
        let token = codec.sign(&claims).unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = TokenCodec::new(
            b"ffffffffffffffffffffffffffffffff",
            Duration::minutes(30),
            Duration::days(7),
        )
        .unwrap();
        let (token, _) = other
            .encode(Uuid::new_v4(), Uuid::new_v4(), TokenKind::Access)
            .unwrap();
        assert!(matches!(codec().decode(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec();
        let (token, _) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), TokenKind::Access)
            .unwrap();
        let (forged, _) = codec
            .encode(Uuid::new_v4(), Uuid::new_v4(), TokenKind::Refresh)
            .unwrap();

        // Splice the forged payload under the original signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert!(matches!(codec.decode(&spliced), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            subject: Uuid::new_v4(),
            version: Uuid::new_v4(),
            kind: TokenKind::Access,
            issued_at: now,
            expires_at: now + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(codec().decode(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = codec();
        for token in ["", "invalid.token.here", "a.b", "not a token at all"] {
            assert!(
                matches!(codec.decode(token), Err(AuthError::TokenInvalid)),
                "accepted {token:?}"
            );
        }
    }

    #[test]
    fn short_secret_is_rejected() {
        let result = TokenCodec::new(b"too-short", Duration::minutes(30), Duration::days(7));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let result = TokenCodec::new(SECRET, Duration::zero(), Duration::days(7));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn ttl_past_representable_time_is_rejected() {
        let huge = Duration::try_days(100_000_000_000).unwrap();
        let result = TokenCodec::new(SECRET, Duration::minutes(30), huge);
        assert!(matches!(result, Err(AuthError::Config(_))));
        let result = TokenCodec::new(SECRET, huge, Duration::days(7));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}

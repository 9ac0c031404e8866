//! Password hashing via bcrypt.

use tracing::debug;

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Lowest cost bcrypt accepts. Only suitable for tests.
pub const MIN_BCRYPT_COST: u32 = 4;

const MAX_BCRYPT_COST: u32 = 31;

/// Salted, adaptive password hashing.
///
/// The salt is generated per call and embedded in the digest, so a digest is
/// self-contained for [`PasswordHasher::verify`].
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Creates a hasher with the given bcrypt cost (valid range 4..=31).
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(AuthError::Config(format!(
                "bcrypt cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {cost}"
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a bcrypt digest.
    ///
    /// A malformed digest counts as a failed verification.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        match bcrypt::verify(password, digest) {
            Ok(matches) => matches,
            Err(e) => {
                debug!(error = %e, "password digest could not be parsed");
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_BCRYPT_COST).unwrap()
    }

    #[test]
    fn hash_then_verify_matches() {
        let h = hasher();
        let digest = h.hash("password123").unwrap();
        assert!(h.verify("password123", &digest));
        assert!(!h.verify("password124", &digest));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let h = hasher();
        let a = h.hash("password123").unwrap();
        let b = h.hash("password123").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("password123", &a));
        assert!(h.verify("password123", &b));
    }

    #[test]
    fn malformed_digest_fails_verification() {
        let h = hasher();
        assert!(!h.verify("password123", "not-a-bcrypt-digest"));
        assert!(!h.verify("password123", ""));
    }

    #[test]
    fn digest_embeds_cost() {
        let digest = hasher().hash("password123").unwrap();
        assert!(digest.starts_with("$2b$04$"), "unexpected digest: {digest}");
    }

    #[test]
    fn rejects_out_of_range_cost() {
        assert!(matches!(PasswordHasher::new(3), Err(AuthError::Config(_))));
        assert!(matches!(PasswordHasher::new(32), Err(AuthError::Config(_))));
    }
}

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::AuthError;

/// One-way password hashing with a random per-record salt.
///
/// Hashes are PHC strings, so the salt and parameters travel with the hash
/// and verification works across parameter changes.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hasher with explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, raw: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    /// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify(&self, raw: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|err| AuthError::Hashing(err.to_string()))?;
        Ok(self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("123mypw").unwrap();
        assert_ne!(hash, "123mypw");
        assert!(hasher.verify("123mypw", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = hasher();
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn default_hasher_verifies_light_hashes() {
        let hash = hasher().hash("secret").unwrap();
        assert!(PasswordHasher::new().verify("secret", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(hasher().verify("secret", "not-a-phc-string").is_err());
    }
}

//! Argon2id implementation of the `PasswordHasher` port.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::user::PlainPassword;

/// Argon2id hasher with the crate's default parameters, which track the
/// OWASP recommendation.
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &PlainPassword) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::new(err.to_string()))
    }

    fn verify(&self, stored_hash: &str, candidate: &str) -> bool {
        // A hash that fails to parse can never match; treat it as a failed
        // login rather than an error the caller must distinguish.
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn password(raw: &str) -> PlainPassword {
        PlainPassword::new(raw, "password").expect("valid test password")
    }

    #[rstest]
    fn hash_then_verify_round_trips() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash(&password("hunter2")).expect("hashing succeeds");

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify(&hash, "hunter2"));
        assert!(!hasher.verify(&hash, "hunter3"));
    }

    #[rstest]
    fn salts_make_hashes_unique() {
        let hasher = Argon2PasswordHasher;
        let first = hasher.hash(&password("hunter2")).expect("hash");
        let second = hasher.hash(&password("hunter2")).expect("hash");
        assert_ne!(first, second);
    }

    #[rstest]
    fn malformed_stored_hash_verifies_false() {
        let hasher = Argon2PasswordHasher;
        assert!(!hasher.verify("not-a-phc-string", "hunter2"));
        assert!(!hasher.verify("", "hunter2"));
    }
}

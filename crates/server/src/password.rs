//! Argon2id password hashing and verification (PHC string format).
//!
//! The engine stores hashes as opaque strings; all hashing lives here.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::ServerError;

pub(crate) fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            tracing::error!("password hashing failed: {err}");
            ServerError::Generic("could not process password".to_string())
        })
}

/// `false` on mismatch or malformed stored hash; never panics.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = argon2::PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2!").map_err(|_| "hash").unwrap();
        assert!(verify_password("hunter2!", &hash));
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2!").map_err(|_| "hash").unwrap();
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn malformed_hash_is_rejected() {
        assert!(!verify_password("pw", "not-a-hash"));
        assert!(!verify_password("pw", ""));
    }
}

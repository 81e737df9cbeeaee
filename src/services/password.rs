use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct HashingError(pub String);

pub fn hash_password(password: &str) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashingError(e.to_string()))
}

/// Returns false for a mismatch and for a malformed stored hash alike.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn is_strong_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip() {
        let hash = hash_password("string").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("string", &hash));
        assert!(!verify_password("strings", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("string", "string"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn minimum_length() {
        assert!(is_strong_enough("string"));
        assert!(!is_strong_enough("short"));
    }
}

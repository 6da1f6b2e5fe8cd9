/// Password hashing using Argon2id
///
/// Hashes are stored in PHC string format, so the parameters and salt travel
/// with the hash and verification never needs configuration.
///
/// # Parameters
///
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery staple")?;
///
/// assert!(verify_password("correct horse battery staple", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash isn't a parseable PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with a fresh random salt
///
/// Output looks like `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Checks `password` against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password and an error only when the stored
/// hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
    }
}

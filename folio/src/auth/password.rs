//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{config::PasswordConfig, errors::Error};

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self::from(&PasswordConfig::default())
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Hash a string using Argon2id with the given parameters.
pub fn hash_string_with_params(input: &str, params: Argon2Params) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Hash a string using Argon2 with default parameters.
pub fn hash_string(input: &str) -> Result<String, Error> {
    hash_string_with_params(input, Argon2Params::default())
}

/// Verify a string against a PHC-formatted hash.
///
/// Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    let argon2 = Argon2::default();
    Ok(argon2.verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Check that a configured hash is a parseable PHC string.
pub fn is_valid_hash(hash: &str) -> bool {
    PasswordHash::new(hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> Argon2Params {
        Argon2Params {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_string_hashing() {
        let input = "test_password_123";
        let hash = hash_string_with_params(input, fast_params()).unwrap();

        assert!(!hash.is_empty());
        assert!(is_valid_hash(&hash));
        assert!(verify_string(input, &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let input = "same_password";

        let hash1 = hash_string_with_params(input, fast_params()).unwrap();
        let hash2 = hash_string_with_params(input, fast_params()).unwrap();

        // Salted, so hashes differ but both verify
        assert_ne!(hash1, hash2);
        assert!(verify_string(input, &hash1).unwrap());
        assert!(verify_string(input, &hash2).unwrap());
    }

    #[test]
    fn test_default_params_hash_verifies() {
        let hash = hash_string("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_string("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        assert!(!is_valid_hash("plaintext"));
        assert!(matches!(verify_string("x", "plaintext"), Err(Error::Internal { .. })));
    }
}

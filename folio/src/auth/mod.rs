//! Admin authentication.
//!
//! Folio has exactly one editor: the admin configured under `admin` in the config file. The admin
//! logs in at `/authentication/login` with email and password; the password is checked against an
//! argon2 hash and a signed JWT is returned in an HTTP-only session cookie. Every `/admin/api`
//! handler takes an [`AdminSession`] extractor, which accepts that cookie or the same token in an
//! `Authorization: Bearer` header.
//!
//! # Modules
//!
//! - [`current_admin`]: the [`AdminSession`] extractor
//! - [`password`]: password hashing and verification using Argon2
//! - [`session`]: JWT session token creation and verification

pub mod current_admin;
pub mod password;
pub mod session;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{AdminConfig, PasswordConfig};
use crate::errors::Error;

pub use current_admin::AdminSession;

/// The admin identity, resolved from configuration at startup.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// Resolve credentials from config, hashing a plaintext password if one was given.
    ///
    /// Returns `Ok(None)` when no admin is configured; the admin API then rejects every request.
    pub fn from_config(admin: &AdminConfig, password_config: &PasswordConfig) -> Result<Option<Self>, Error> {
        let Some(email) = admin.email.clone() else {
            return Ok(None);
        };

        let password_hash = match (&admin.password, &admin.password_hash) {
            (Some(password), None) => password::hash_string_with_params(password, password_config.into())?,
            (None, Some(hash)) if password::is_valid_hash(hash) => hash.clone(),
            (None, Some(_)) => {
                return Err(Error::Internal {
                    operation: "load admin credentials: admin.password_hash is not a valid PHC string".to_string(),
                });
            }
            _ => {
                return Err(Error::Internal {
                    operation: "load admin credentials: exactly one of admin.password or admin.password_hash is required".to_string(),
                });
            }
        };

        Ok(Some(Self { email, password_hash }))
    }
}

/// Identity returned by the session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminInfo {
    pub email: String,
}

impl From<AdminSession> for AdminInfo {
    fn from(session: AdminSession) -> Self {
        Self { email: session.email }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordConfig {
        PasswordConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_no_admin_configured() {
        let creds = AdminCredentials::from_config(&AdminConfig::default(), &fast()).unwrap();
        assert!(creds.is_none());
    }

    #[test]
    fn test_plaintext_password_is_hashed() {
        let admin = AdminConfig {
            email: Some("owner@example.com".into()),
            password: Some("a long passphrase".into()),
            password_hash: None,
        };

        let creds = AdminCredentials::from_config(&admin, &fast()).unwrap().unwrap();
        assert_ne!(creds.password_hash, "a long passphrase");
        assert!(password::verify_string("a long passphrase", &creds.password_hash).unwrap());
        assert!(!format!("{creds:?}").contains(&creds.password_hash));
    }

    #[test]
    fn test_invalid_hash_rejected() {
        let admin = AdminConfig {
            email: Some("owner@example.com".into()),
            password: None,
            password_hash: Some("not-a-hash".into()),
        };

        assert!(AdminCredentials::from_config(&admin, &fast()).is_err());
    }
}

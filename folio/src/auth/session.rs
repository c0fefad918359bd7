//! JWT session token creation and verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{auth::AdminSession, config::Config, errors::Error};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // Admin email
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl SessionClaims {
    pub fn new(email: &str, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.jwt_expiry;

        Self {
            sub: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a JWT token for an admin session
pub fn create_session_token(email: &str, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(email, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, config: &Config) -> Result<AdminSession, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(AdminSession {
        email: token_data.claims.sub,
    })
}

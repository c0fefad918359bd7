use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{instrument, trace};

use crate::{
    AppState,
    auth::session,
    config::Config,
    errors::{Error, Result},
};

/// An authenticated admin. Use as an extractor to protect a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub email: String,
}

/// Extract the session from the session cookie if present and valid
/// Returns:
/// - None: No session cookie present, or none that verifies
/// - Some(Ok(session)): Valid token found and verified
/// - Some(Err(error)): Cookie header present but unreadable
fn try_cookie_session(parts: &Parts, config: &Config) -> Option<Result<AdminSession>> {
    let cookie_header = parts.headers.get(header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=')
            && name == cookie_name
            && let Ok(session) = session::verify_session_token(value, config)
        {
            return Some(Ok(session));
        }
    }
    None
}

/// Extract the session from an `Authorization: Bearer` header
fn try_bearer_session(parts: &Parts, config: &Config) -> Option<Result<AdminSession>> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Some(session::verify_session_token(token.trim(), config))
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(admin) = state.admin.as_ref() else {
            return Err(Error::Unauthenticated {
                message: Some("Admin access is not configured".to_string()),
            });
        };

        let session = match try_cookie_session(parts, &state.config) {
            Some(result) => result?,
            None => match try_bearer_session(parts, &state.config) {
                Some(result) => result?,
                None => {
                    trace!("No admin session on request");
                    return Err(Error::Unauthenticated { message: None });
                }
            },
        };

        // Tokens issued for a previous admin email stop working once the config changes
        if session.email != admin.email {
            return Err(Error::Unauthenticated { message: None });
        }

        Ok(session)
    }
}

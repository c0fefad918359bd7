use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Invalid request data or content validation failure
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload or body larger than the configured limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Required collaborator (database, object storage) is unavailable
    #[error("{message}")]
    Unavailable { message: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Conflicting state, e.g. resolving a notification that is no longer pending
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::InvalidTransition { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::BadRequest { message } | Error::PayloadTooLarge { message } | Error::Unavailable { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, .. } => match table.as_deref() {
                    Some("portfolio_data") => "Portfolio content already exists for this owner".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::InvalidTransition { entity, from, to } => format!("Cannot move {entity} from {from} to {to}"),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
            Error::Conflict { message } => message.clone(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Unavailable { .. } => {
                tracing::warn!("Dependency unavailable: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            Error::Conflict { message } => {
                let body = serde_json::json!({ "message": message });
                (status, axum::response::Json(body)).into_response()
            }
            _ => (status, self.user_message()).into_response(),
        }
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::BadRequest { message: "x".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::PayloadTooLarge { message: "x".into() }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(Error::Unauthenticated { message: None }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::Database(DbError::InvalidTransition {
                entity: "notification".into(),
                from: "sent".into(),
                to: "failed".into(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = Error::Other(anyhow::anyhow!("connection refused at 10.0.0.3:5432"));
        assert_eq!(err.user_message(), "Internal server error");

        let err = Error::Database(DbError::Other(anyhow::anyhow!("relation does not exist")));
        assert_eq!(err.user_message(), "Database error occurred");
    }

    #[test]
    fn test_unauthenticated_message() {
        assert_eq!(Error::Unauthenticated { message: None }.user_message(), "Authentication required");
        assert_eq!(
            Error::Unauthenticated {
                message: Some("Session expired".into())
            }
            .user_message(),
            "Session expired"
        );
    }
}

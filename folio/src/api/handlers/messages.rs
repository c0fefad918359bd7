use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AdminSession,
    db::{
        errors::DbError,
        models::contact_messages::{ContactMessage, ContactMessageFilter, ContactMessageUpdate},
    },
    errors::{Error, Result},
};

/// Contact inbox, newest first
#[utoipa::path(
    get,
    path = "/admin/api/messages",
    params(ContactMessageFilter),
    tag = "contact",
    responses(
        (status = 200, description = "Contact messages", body = Vec<ContactMessage>),
        (status = 401, description = "Admin session required"),
        (status = 503, description = "Database unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(filter): Query<ContactMessageFilter>,
) -> Result<Json<Vec<ContactMessage>>> {
    if filter.skip < 0 || !(1..=500).contains(&filter.limit) {
        return Err(Error::BadRequest {
            message: "skip must be non-negative and limit between 1 and 500".to_string(),
        });
    }

    let messages = state.backend.list_contact_messages(&filter).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to list contact messages");
        Error::Unavailable {
            message: "Messages are unavailable while the database is unreachable".to_string(),
        }
    })?;
    Ok(Json(messages))
}

/// Mark a message as read or replied
#[utoipa::path(
    patch,
    path = "/admin/api/messages/{id}",
    request_body = ContactMessageUpdate,
    params(("id" = String, Path, description = "Message ID")),
    tag = "contact",
    responses(
        (status = 200, description = "Updated message", body = ContactMessage),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "No such message"),
    )
)]
#[tracing::instrument(skip_all, fields(message_id = %id))]
pub async fn update_message(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    Json(update): Json<ContactMessageUpdate>,
) -> Result<Json<ContactMessage>> {
    match state.backend.update_contact_message_status(id, update.status).await {
        Ok(message) => Ok(Json(message)),
        Err(DbError::NotFound) => Err(Error::NotFound {
            resource: "Contact message".to_string(),
            id: id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

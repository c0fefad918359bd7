use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};

use crate::{
    AppState,
    api::models::contact::ContactResponse,
    errors::{Error, Result},
    notifications::ContactSubmission,
    sync::remote::ClientInfo,
};

/// Submit a message through the public contact form
///
/// The message is stored first; the owner notification is attempted afterwards and its outcome
/// does not affect the response.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactSubmission,
    tag = "contact",
    responses(
        (status = 200, description = "Message stored", body = ContactResponse),
        (status = 400, description = "A required field is empty"),
        (status = 503, description = "Message could not be stored", body = ContactResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<ContactSubmission>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    if !submission.is_complete() {
        return Err(Error::BadRequest {
            message: "Name, email, subject and message are all required".to_string(),
        });
    }

    let client = ClientInfo::from_headers(&headers);
    let success = state.store.remote().submit_contact_message(&submission, client).await;

    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(ContactResponse { success })))
}

#[cfg(test)]
mod tests {
    use crate::db::{Backend, InMemoryBackend, models::contact_messages::ContactMessageFilter};
    use crate::test_utils::{FlakyBackend, create_test_app, create_test_app_with};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    fn body() -> serde_json::Value {
        json!({
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "subject": "Compilers",
            "message": "Let's talk about COBOL."
        })
    }

    #[tokio::test]
    async fn test_contact_message_stored_with_client_info() {
        let app = create_test_app().await;

        let response = app
            .server
            .post("/api/contact")
            .add_header("x-forwarded-for", "198.51.100.7, 10.0.0.1")
            .add_header("user-agent", "Mozilla/5.0")
            .json(&body())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "success": true }));

        let messages = app.backend.list_contact_messages(&ContactMessageFilter::default()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].email, "grace@example.com");
        assert_eq!(messages[0].ip_address, "198.51.100.7");
        assert_eq!(messages[0].user_agent, "Mozilla/5.0");
    }

    #[tokio::test]
    async fn test_blank_field_rejected() {
        let app = create_test_app().await;
        let mut submission = body();
        submission["subject"] = json!("   ");

        app.server
            .post("/api/contact")
            .json(&submission)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let messages = app.backend.list_contact_messages(&ContactMessageFilter::default()).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_database_returns_503() {
        let flaky = Arc::new(FlakyBackend::new(InMemoryBackend::new()));
        let app = create_test_app_with(flaky.clone(), None).await;
        flaky.set_available(false);

        let response = app.server.post("/api/contact").json(&body()).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        response.assert_json(&json!({ "success": false }));
    }
}

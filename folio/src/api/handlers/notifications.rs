//! Owner notifications for contact form submissions.
//!
//! `POST /api/send-notification` keeps the JSON envelope the public site's notifier already
//! understands, so its responses are built here rather than through [`Error`].

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::models::contact::{NotificationErrorResponse, SendNotificationResponse},
    auth::AdminSession,
    db::models::email_notifications::{EmailNotification, EmailNotificationFilter},
    errors::{Error, Result},
    notifications::{ContactSubmission, Delivery},
};

fn internal_error(details: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(NotificationErrorResponse {
            error: "Internal server error".to_string(),
            details: Some(details),
        }),
    )
        .into_response()
}

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(NotificationErrorResponse {
            error: "Missing required fields".to_string(),
            details: None,
        }),
    )
        .into_response()
}

/// Record and deliver the owner notification for a contact submission
#[utoipa::path(
    post,
    path = "/api/send-notification",
    request_body = ContactSubmission,
    tag = "contact",
    responses(
        (status = 200, description = "Notification sent", body = SendNotificationResponse),
        (status = 400, description = "A required field is missing", body = NotificationErrorResponse),
        (status = 500, description = "Delivery failed, or the body was not readable JSON", body = SendNotificationResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_notification(State(state): State<AppState>, body: std::result::Result<Json<ContactSubmission>, JsonRejection>) -> Response {
    let submission = match body {
        Ok(Json(submission)) => submission,
        // Well-formed JSON with null or mistyped fields
        Err(JsonRejection::JsonDataError(e)) => {
            tracing::debug!(error = %e, "Unusable notification fields");
            return missing_fields();
        }
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unreadable notification request");
            return internal_error(rejection.body_text());
        }
    };
    if !submission.is_complete() {
        return missing_fields();
    }

    // Delivery runs to completion even if the caller goes away
    let service = state.notifications.clone();
    let delivery = match tokio::spawn(async move { service.process(&submission).await }).await {
        Ok(delivery) => delivery,
        Err(e) => {
            tracing::error!(error = %e, "Notification task failed");
            return internal_error(e.to_string());
        }
    };

    match delivery {
        Delivery::Sent { notification_id } => (
            StatusCode::OK,
            Json(SendNotificationResponse {
                success: true,
                message: "Message received and notification sent successfully".to_string(),
                notification_id,
                error: None,
            }),
        )
            .into_response(),
        Delivery::Failed { notification_id, error } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SendNotificationResponse {
                success: false,
                message: "Message received but email notification failed".to_string(),
                notification_id,
                error: Some(error),
            }),
        )
            .into_response(),
    }
}

/// List notification records, newest first
#[utoipa::path(
    get,
    path = "/admin/api/notifications",
    params(EmailNotificationFilter),
    tag = "contact",
    responses(
        (status = 200, description = "Notifications", body = Vec<EmailNotification>),
        (status = 401, description = "Admin session required"),
        (status = 503, description = "Database unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_notifications(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(filter): Query<EmailNotificationFilter>,
) -> Result<Json<Vec<EmailNotification>>> {
    let notifications = state.backend.list_notifications(&filter).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to list notifications");
        Error::Unavailable {
            message: "Notifications are unavailable while the database is unreachable".to_string(),
        }
    })?;
    Ok(Json(notifications))
}

#[cfg(test)]
mod tests {
    use crate::api::models::contact::{NotificationErrorResponse, SendNotificationResponse};
    use crate::db::models::email_notifications::{EmailNotification, NotificationStatus};
    use crate::test_utils::{create_test_app, login_cookie};
    use axum::http::StatusCode;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "subject": "Compilers",
            "message": "Let's talk about COBOL."
        })
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let app = create_test_app().await;

        let response = app
            .server
            .post("/api/send-notification")
            .json(&json!({ "name": "Grace", "email": "grace@example.com" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Missing required fields" }));
    }

    #[tokio::test]
    async fn test_null_field_counts_as_missing() {
        let app = create_test_app().await;

        let mut submission = body();
        submission["subject"] = serde_json::Value::Null;
        let response = app.server.post("/api/send-notification").json(&submission).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Missing required fields" }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_internal_error() {
        let app = create_test_app().await;

        let response = app
            .server
            .post("/api/send-notification")
            .text("{\"name\": \"Grace\",")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let error: NotificationErrorResponse = response.json();
        assert_eq!(error.error, "Internal server error");
        assert!(error.details.is_some());

        let cookie = login_cookie(&app.server).await;
        let notifications: Vec<EmailNotification> = app.server.get("/admin/api/notifications").add_header("cookie", cookie).await.json();
        assert!(notifications.is_empty());
    }

    #[tokio::test]
    async fn test_notification_sent_links_latest_message() {
        let app = create_test_app().await;
        app.server.post("/api/contact").json(&body()).await.assert_status_ok();

        let response = app.server.post("/api/send-notification").json(&body()).await;
        response.assert_status_ok();
        let sent: SendNotificationResponse = response.json();
        assert!(sent.success);
        assert_eq!(sent.message, "Message received and notification sent successfully");
        let notification_id = sent.notification_id.unwrap();

        let cookie = login_cookie(&app.server).await;
        let notifications: Vec<EmailNotification> = app.server.get("/admin/api/notifications").add_header("cookie", cookie).await.json();
        // One from the contact form's own notifier, one from this request
        assert_eq!(notifications.len(), 2);
        let row = notifications.iter().find(|n| n.id == notification_id).unwrap();
        assert_eq!(row.status, NotificationStatus::Sent);
        assert!(row.sent_at.is_some());
        assert!(row.contact_message_id.is_some());
        assert_eq!(row.subject, "New Contact Form Submission: Compilers");

        let emails = std::fs::read_dir(app.dir.path().join("emails")).unwrap().count();
        assert!(emails >= 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_delivery_failure_marks_row_failed() {
        let app = create_test_app().await;
        std::fs::remove_dir_all(app.dir.path().join("emails")).unwrap();

        let response = app.server.post("/api/send-notification").json(&body()).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let failed: SendNotificationResponse = response.json();
        assert!(!failed.success);
        assert_eq!(failed.message, "Message received but email notification failed");
        assert!(failed.error.is_some());

        let cookie = login_cookie(&app.server).await;
        let notifications: Vec<EmailNotification> = app
            .server
            .get("/admin/api/notifications")
            .add_query_param("status", "failed")
            .add_header("cookie", cookie)
            .await
            .json();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].id, failed.notification_id.unwrap());
        assert!(notifications[0].error_message.is_some());
        assert!(notifications[0].contact_message_id.is_none());
    }
}

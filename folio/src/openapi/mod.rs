//! OpenAPI documentation for the public, authentication and admin endpoints.
//!
//! Served by Scalar at `/docs`, with the raw document at `/docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, auth, content, db, notifications, storage, sync};

/// Session cookie and bearer token schemes for the admin API.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "SessionCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "folio_session",
                    "Session cookie set by `POST /authentication/login`",
                ))),
            );
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("The session token from the login cookie, sent as `Authorization: Bearer <token>`"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Folio", description = "Portfolio content service"),
    modifiers(&SecurityAddon),
    security(("SessionCookie" = []), ("BearerAuth" = [])),
    paths(
        api::handlers::portfolio::get_portfolio,
        api::handlers::portfolio::get_status,
        api::handlers::contact::submit_contact,
        api::handlers::notifications::send_notification,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::get_session,
        api::handlers::portfolio::update_profile,
        api::handlers::portfolio::replace_skills,
        api::handlers::portfolio::replace_projects,
        api::handlers::portfolio::update_contact,
        api::handlers::portfolio::update_cv,
        api::handlers::portfolio::save,
        api::handlers::portfolio::reload,
        api::handlers::portfolio::reset,
        api::handlers::uploads::upload_profile_image,
        api::handlers::uploads::upload_project_image,
        api::handlers::uploads::upload_cv,
        api::handlers::uploads::delete_cv,
        api::handlers::uploads::delete_upload,
        api::handlers::messages::list_messages,
        api::handlers::messages::update_message,
        api::handlers::notifications::list_notifications,
    ),
    components(schemas(
        content::Snapshot,
        content::Profile,
        content::ProfileTag,
        content::Skill,
        content::Project,
        content::ProjectStats,
        content::ContactInfo,
        content::Cv,
        content::StoredFile,
        content::Stat,
        content::Highlight,
        content::JourneyStep,
        content::ProfilePatch,
        content::ContactPatch,
        content::CvPatch,
        sync::store::StoreStatus,
        sync::store::LastSave,
        sync::store::SnapshotSource,
        sync::store::SaveOutcome,
        notifications::ContactSubmission,
        storage::UploadKind,
        auth::AdminInfo,
        api::models::auth::LoginRequest,
        api::models::auth::AuthResponse,
        api::models::auth::AuthSuccessResponse,
        api::models::portfolio::SaveResponse,
        api::models::portfolio::ReloadResponse,
        api::models::portfolio::ResetResponse,
        api::models::contact::ContactResponse,
        api::models::contact::SendNotificationResponse,
        api::models::contact::NotificationErrorResponse,
        api::models::uploads::UploadResponse,
        api::models::uploads::DeleteUploadRequest,
        api::models::uploads::DeleteUploadResponse,
        api::models::uploads::UploadForm,
        db::models::contact_messages::ContactMessage,
        db::models::contact_messages::ContactMessageStatus,
        db::models::contact_messages::ContactMessageUpdate,
        db::models::email_notifications::EmailNotification,
        db::models::email_notifications::NotificationStatus,
    )),
    tags(
        (name = "portfolio", description = "Portfolio content"),
        (name = "contact", description = "Contact form, inbox and owner notifications"),
        (name = "uploads", description = "Images and CV uploads"),
        (name = "authentication", description = "Admin session"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/portfolio",
            "/api/contact",
            "/api/send-notification",
            "/authentication/login",
            "/admin/api/uploads/projects/{project_id}/image",
            "/admin/api/messages/{id}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("SessionCookie"));
    }
}

//! Portfolio content: the public read model and the admin editing endpoints.
//!
//! Every edit is validated before it reaches the [`ContentStore`](crate::sync::store::ContentStore);
//! a rejected edit leaves the content and the pending-edit state untouched. Accepted edits are
//! persisted by the store's debouncer, or immediately through `POST /admin/api/portfolio/save`.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::portfolio::{ReloadResponse, ResetResponse, SaveResponse},
    auth::AdminSession,
    content::{
        ContactPatch, CvPatch, ProfilePatch, Project, Skill, Snapshot,
        validation::{validate_contact_patch, validate_cv_patch, validate_profile_patch, validate_projects, validate_skills},
    },
    errors::Result,
    sync::store::StoreStatus,
};

/// Current portfolio content
#[utoipa::path(
    get,
    path = "/api/portfolio",
    tag = "portfolio",
    responses(
        (status = 200, description = "Current content", body = Snapshot),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_portfolio(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.store.snapshot().await)
}

/// Sync state of the content store
#[utoipa::path(
    get,
    path = "/api/portfolio/status",
    tag = "portfolio",
    responses(
        (status = 200, description = "Store status", body = StoreStatus),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_status(State(state): State<AppState>) -> Json<StoreStatus> {
    Json(state.store.status().await)
}

#[utoipa::path(
    patch,
    path = "/admin/api/profile",
    request_body = ProfilePatch,
    tag = "portfolio",
    responses(
        (status = 200, description = "Updated content", body = Snapshot),
        (status = 400, description = "Invalid profile"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(State(state): State<AppState>, _admin: AdminSession, Json(patch): Json<ProfilePatch>) -> Result<Json<Snapshot>> {
    validate_profile_patch(&patch)?;
    Ok(Json(state.store.update_profile(patch).await))
}

/// Replace the skill list
#[utoipa::path(
    put,
    path = "/admin/api/skills",
    request_body = Vec<Skill>,
    tag = "portfolio",
    responses(
        (status = 200, description = "Updated content", body = Snapshot),
        (status = 400, description = "Invalid skills"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all, fields(count = skills.len()))]
pub async fn replace_skills(State(state): State<AppState>, _admin: AdminSession, Json(skills): Json<Vec<Skill>>) -> Result<Json<Snapshot>> {
    validate_skills(&skills)?;
    Ok(Json(state.store.update_skills(skills).await))
}

/// Replace the project list
#[utoipa::path(
    put,
    path = "/admin/api/projects",
    request_body = Vec<Project>,
    tag = "portfolio",
    responses(
        (status = 200, description = "Updated content", body = Snapshot),
        (status = 400, description = "Invalid projects"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all, fields(count = projects.len()))]
pub async fn replace_projects(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(projects): Json<Vec<Project>>,
) -> Result<Json<Snapshot>> {
    validate_projects(&projects)?;
    Ok(Json(state.store.update_projects(projects).await))
}

#[utoipa::path(
    patch,
    path = "/admin/api/contact",
    request_body = ContactPatch,
    tag = "portfolio",
    responses(
        (status = 200, description = "Updated content", body = Snapshot),
        (status = 400, description = "Invalid contact details"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_contact(State(state): State<AppState>, _admin: AdminSession, Json(patch): Json<ContactPatch>) -> Result<Json<Snapshot>> {
    validate_contact_patch(&patch)?;
    Ok(Json(state.store.update_contact(patch).await))
}

#[utoipa::path(
    patch,
    path = "/admin/api/cv",
    request_body = CvPatch,
    tag = "portfolio",
    responses(
        (status = 200, description = "Updated content", body = Snapshot),
        (status = 400, description = "Invalid CV settings"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_cv(State(state): State<AppState>, _admin: AdminSession, Json(patch): Json<CvPatch>) -> Result<Json<Snapshot>> {
    validate_cv_patch(&patch)?;
    Ok(Json(state.store.update_cv(patch).await))
}

/// Save now instead of waiting for the debouncer
#[utoipa::path(
    post,
    path = "/admin/api/portfolio/save",
    tag = "portfolio",
    responses(
        (status = 200, description = "Save outcome", body = SaveResponse),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn save(State(state): State<AppState>, _admin: AdminSession) -> Json<SaveResponse> {
    let outcome = state.store.save().await;
    tracing::info!(outcome = ?outcome, "Manual save");
    Json(SaveResponse { outcome })
}

/// Reload content from the database, the cache or the defaults
#[utoipa::path(
    post,
    path = "/admin/api/portfolio/reload",
    tag = "portfolio",
    responses(
        (status = 200, description = "Where the content came from", body = ReloadResponse),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reload(State(state): State<AppState>, _admin: AdminSession) -> Json<ReloadResponse> {
    let source = state.store.load().await;
    let is_database_connected = state.store.status().await.is_database_connected;
    Json(ReloadResponse {
        source,
        is_database_connected,
    })
}

/// Restore the seed content and drop the local cache
#[utoipa::path(
    post,
    path = "/admin/api/portfolio/reset",
    tag = "portfolio",
    responses(
        (status = 200, description = "Content reset", body = ResetResponse),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset(State(state): State<AppState>, _admin: AdminSession) -> Json<ResetResponse> {
    let outcome = state.store.reset().await;
    tracing::info!(outcome = ?outcome, "Content reset to defaults");
    Json(ResetResponse { outcome })
}

#[cfg(test)]
mod tests {
    use crate::api::models::portfolio::{ReloadResponse, ResetResponse};
    use crate::content::{Snapshot, defaults};
    use crate::db::Backend;
    use crate::sync::store::{SaveOutcome, SnapshotSource};
    use crate::test_utils::{create_test_app, login_cookie};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_public_portfolio_serves_defaults() {
        let app = create_test_app().await;

        let response = app.server.get("/api/portfolio").await;
        response.assert_status_ok();
        let snapshot: Snapshot = response.json();
        assert_eq!(snapshot, defaults::seed());

        let status: Value = app.server.get("/api/portfolio/status").await.json();
        assert_eq!(status["is_database_connected"], true);
        assert_eq!(status["is_loading"], false);
        assert_eq!(status["pending_edits"], false);
    }

    #[tokio::test]
    async fn test_edits_require_admin_session() {
        let app = create_test_app().await;

        app.server
            .patch("/admin/api/profile")
            .json(&json!({ "name": "Intruder" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server.post("/admin/api/portfolio/save").await.assert_status(StatusCode::UNAUTHORIZED);

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot.profile.name, defaults::seed().profile.name);
    }

    #[tokio::test]
    async fn test_profile_patch_then_save() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let response = app
            .server
            .patch("/admin/api/profile")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "name": "Ada Lovelace", "location": "London" }))
            .await;
        response.assert_status_ok();
        let snapshot: Snapshot = response.json();
        assert_eq!(snapshot.profile.name, "Ada Lovelace");
        assert_eq!(snapshot.profile.title, defaults::seed().profile.title);

        let status: Value = app.server.get("/api/portfolio/status").await.json();
        assert_eq!(status["pending_edits"], true);

        let saved = app.server.post("/admin/api/portfolio/save").add_header("cookie", cookie).await;
        saved.assert_status_ok();
        saved.assert_json(&json!({ "outcome": "remote" }));

        let stored = app.backend.load_snapshot(&app.state.config.sync.owner_key).await.unwrap().unwrap();
        assert_eq!(stored["profile"]["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_invalid_skills_rejected_without_mutation() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let response = app
            .server
            .put("/admin/api/skills")
            .add_header("cookie", cookie)
            .json(&json!([
                { "id": "1", "name": "Rust", "level": 140, "icon": "code", "category": "Backend" }
            ]))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot.skills, defaults::skills());
        let status: Value = app.server.get("/api/portfolio/status").await.json();
        assert_eq!(status["pending_edits"], false);
    }

    #[tokio::test]
    async fn test_projects_with_bad_urls_rejected() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let mut project = serde_json::to_value(&defaults::seed().projects[0]).unwrap();
        project["demoUrl"] = json!("not a url");

        app.server
            .put("/admin/api/projects")
            .add_header("cookie", cookie.clone())
            .json(&json!([project]))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        project["demoUrl"] = json!("https://demo.example.com");
        let response = app
            .server
            .put("/admin/api/projects")
            .add_header("cookie", cookie)
            .json(&json!([project]))
            .await;
        response.assert_status_ok();
        let snapshot: Snapshot = response.json();
        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.projects[0].demo_url, "https://demo.example.com");
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        app.server
            .patch("/admin/api/contact")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "phone": "+44 20 7946 0000" }))
            .await
            .assert_status_ok();

        let response = app.server.post("/admin/api/portfolio/reset").add_header("cookie", cookie.clone()).await;
        response.assert_status_ok();
        let reset: ResetResponse = response.json();
        assert_eq!(reset.outcome, Some(SaveOutcome::Remote));

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot, defaults::seed());

        let reload: ReloadResponse = app.server.post("/admin/api/portfolio/reload").add_header("cookie", cookie).await.json();
        assert_eq!(reload.source, SnapshotSource::Remote);
        assert!(reload.is_database_connected);
    }
}

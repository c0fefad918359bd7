//! Admin file uploads: profile picture, project images and the CV.
//!
//! Each upload is validated against [`UploadLimits`](crate::config::UploadLimits) before any
//! storage call. Accepted files go to object storage; when storage is disabled or the put fails
//! the file is embedded as a `data:` URL instead, and the response says so with `inline: true`.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};

use crate::{
    AppState,
    api::models::uploads::{DeleteUploadRequest, DeleteUploadResponse, UploadForm, UploadResponse},
    auth::AdminSession,
    content::StoredFile,
    errors::{Error, Result},
    storage::{UploadKind, UploadedFile, to_data_url, validate_upload},
};

/// Pull the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                file_name
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first())
                    .map(|mime| mime.essence_str().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read file: {e}"),
        })?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(Error::BadRequest {
        message: "Multipart body has no 'file' field".to_string(),
    })
}

/// Validate, then store or inline. Nothing reaches storage unless validation passed.
async fn accept_upload(state: &AppState, kind: UploadKind, multipart: Multipart) -> Result<(UploadedFile, UploadResponse)> {
    let file = read_file_field(multipart).await?;
    validate_upload(kind, &file.content_type, file.size(), state.uploads.limits())?;

    let response = match state.uploads.upload(kind, &file).await {
        Some(url) => UploadResponse { url, inline: false },
        None => {
            tracing::warn!(kind = ?kind, "Object storage unavailable, storing upload inline");
            UploadResponse {
                url: to_data_url(&file.content_type, &file.bytes),
                inline: true,
            }
        }
    };
    Ok((file, response))
}

/// Upload a new profile picture
#[utoipa::path(
    post,
    path = "/admin/api/uploads/profile-image",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    tag = "uploads",
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Not an image"),
        (status = 413, description = "Image too large"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_profile_image(State(state): State<AppState>, _admin: AdminSession, multipart: Multipart) -> Result<Json<UploadResponse>> {
    let (_, response) = accept_upload(&state, UploadKind::ProfileImage, multipart).await?;
    state.store.set_profile_image(response.url.clone()).await;
    Ok(Json(response))
}

/// Upload the image of one project
#[utoipa::path(
    post,
    path = "/admin/api/uploads/projects/{project_id}/image",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(("project_id" = String, Path, description = "Project ID")),
    tag = "uploads",
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Not an image"),
        (status = 404, description = "No such project"),
        (status = 413, description = "Image too large"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all, fields(project_id = %project_id))]
pub async fn upload_project_image(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(project_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let not_found = || Error::NotFound {
        resource: "Project".to_string(),
        id: project_id.clone(),
    };
    if !state.store.snapshot().await.projects.iter().any(|p| p.id == project_id) {
        return Err(not_found());
    }

    let (_, response) = accept_upload(&state, UploadKind::ProjectImage, multipart).await?;
    state
        .store
        .set_project_image(&project_id, response.url.clone())
        .await
        .ok_or_else(not_found)?;
    Ok(Json(response))
}

/// Upload the CV (PDF)
#[utoipa::path(
    post,
    path = "/admin/api/uploads/cv",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    tag = "uploads",
    responses(
        (status = 200, description = "CV stored", body = UploadResponse),
        (status = 400, description = "Not a PDF"),
        (status = 413, description = "File too large"),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_cv(State(state): State<AppState>, _admin: AdminSession, multipart: Multipart) -> Result<Json<UploadResponse>> {
    let (file, response) = accept_upload(&state, UploadKind::Cv, multipart).await?;

    let stored = StoredFile {
        name: file.file_name.clone().unwrap_or_else(|| "cv.pdf".to_string()),
        mime_type: file.content_type.clone(),
        size: file.size(),
    };
    state.store.set_cv_file(response.url.clone(), stored).await;
    Ok(Json(response))
}

/// Remove the CV
#[utoipa::path(
    delete,
    path = "/admin/api/uploads/cv",
    tag = "uploads",
    responses(
        (status = 200, description = "CV cleared; `deleted` tells whether a stored object was removed", body = DeleteUploadResponse),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_cv(State(state): State<AppState>, _admin: AdminSession) -> Json<DeleteUploadResponse> {
    let previous = state.store.clear_cv().await;
    let deleted = !previous.is_empty() && state.uploads.delete_file(&previous, UploadKind::Cv).await;
    Json(DeleteUploadResponse { deleted })
}

/// Delete a stored object by URL
#[utoipa::path(
    delete,
    path = "/admin/api/uploads",
    request_body = DeleteUploadRequest,
    tag = "uploads",
    responses(
        (status = 200, description = "Whether the object was deleted", body = DeleteUploadResponse),
        (status = 401, description = "Admin session required"),
    )
)]
#[tracing::instrument(skip_all, fields(kind = ?request.kind))]
pub async fn delete_upload(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<DeleteUploadRequest>,
) -> Json<DeleteUploadResponse> {
    let deleted = state.uploads.delete_file(&request.url, request.kind).await;
    Json(DeleteUploadResponse { deleted })
}

#[cfg(test)]
mod tests {
    use crate::api::models::uploads::{DeleteUploadResponse, UploadResponse};
    use crate::content::Snapshot;
    use crate::db::InMemoryBackend;
    use crate::storage::MemoryObjectStore;
    use crate::test_utils::{create_test_app, create_test_app_with, login_cookie};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::json;
    use std::sync::Arc;

    fn form(bytes: Vec<u8>, file_name: &str, mime: &str) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(file_name).mime_type(mime))
    }

    #[tokio::test]
    async fn test_profile_image_stored_and_applied() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let response = app
            .server
            .post("/admin/api/uploads/profile-image")
            .add_header("cookie", cookie)
            .multipart(form(vec![0x89, b'P', b'N', b'G'], "me.png", "image/png"))
            .await;
        response.assert_status_ok();
        let upload: UploadResponse = response.json();
        assert!(!upload.inline);
        assert!(upload.url.starts_with("http://localhost/storage/profile-images/avatars/"));
        assert!(upload.url.ends_with(".png"));
        assert_eq!(app.objects.put_count(), 1);

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot.profile.profile_image, upload.url);
    }

    #[tokio::test]
    async fn test_rejected_uploads_never_reach_storage() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let wrong_type = app
            .server
            .post("/admin/api/uploads/profile-image")
            .add_header("cookie", cookie.clone())
            .multipart(form(b"%PDF-1.7".to_vec(), "cv.pdf", "application/pdf"))
            .await;
        wrong_type.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(wrong_type.text(), "Please select a valid image file");

        let too_big = app
            .server
            .post("/admin/api/uploads/profile-image")
            .add_header("cookie", cookie.clone())
            .multipart(form(vec![0u8; 5 * 1024 * 1024 + 1], "big.png", "image/png"))
            .await;
        too_big.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_big.text(), "File size must be less than 5MB");

        let not_pdf = app
            .server
            .post("/admin/api/uploads/cv")
            .add_header("cookie", cookie)
            .multipart(form(b"hello".to_vec(), "cv.txt", "text/plain"))
            .await;
        not_pdf.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(not_pdf.text(), "Please upload a PDF file only");

        assert_eq!(app.objects.put_count(), 0);
        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot, crate::content::defaults::seed());
    }

    #[tokio::test]
    async fn test_storage_disabled_falls_back_to_data_url() {
        let app = create_test_app_with(Arc::new(InMemoryBackend::new()), None).await;
        let cookie = login_cookie(&app.server).await;

        let response = app
            .server
            .post("/admin/api/uploads/projects/1/image")
            .add_header("cookie", cookie)
            .multipart(form(b"GIF89a".to_vec(), "shot.gif", "image/gif"))
            .await;
        response.assert_status_ok();
        let upload: UploadResponse = response.json();
        assert!(upload.inline);
        assert_eq!(upload.url, "data:image/gif;base64,R0lGODlh");

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot.projects[0].image, upload.url);
    }

    #[tokio::test]
    async fn test_failing_storage_falls_back_to_data_url() {
        let objects = Arc::new(MemoryObjectStore::new());
        let app = create_test_app_with(Arc::new(InMemoryBackend::new()), Some(objects.clone())).await;
        objects.set_failing(true);
        let cookie = login_cookie(&app.server).await;

        let upload: UploadResponse = app
            .server
            .post("/admin/api/uploads/profile-image")
            .add_header("cookie", cookie)
            .multipart(form(b"GIF89a".to_vec(), "me.gif", "image/gif"))
            .await
            .json();
        assert!(upload.inline);
        assert!(upload.url.starts_with("data:image/gif;base64,"));
    }

    #[tokio::test]
    async fn test_unknown_project_is_404() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        app.server
            .post("/admin/api/uploads/projects/does-not-exist/image")
            .add_header("cookie", cookie)
            .multipart(form(b"GIF89a".to_vec(), "shot.gif", "image/gif"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        assert_eq!(app.objects.put_count(), 0);
    }

    #[tokio::test]
    async fn test_cv_upload_then_delete() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let upload: UploadResponse = app
            .server
            .post("/admin/api/uploads/cv")
            .add_header("cookie", cookie.clone())
            .multipart(form(b"%PDF-1.7".to_vec(), "resume.pdf", "application/pdf"))
            .await
            .json();
        assert!(upload.url.contains("/documents/resumes/"));

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert_eq!(snapshot.cv.url, upload.url);
        let file = snapshot.cv.file.unwrap();
        assert_eq!(file.name, "resume.pdf");
        assert_eq!(file.size, 8);

        let key = crate::storage::key_from_url(&upload.url).unwrap();
        assert!(app.objects.get("documents", &key).is_some());

        let response = app.server.delete("/admin/api/uploads/cv").add_header("cookie", cookie).await;
        response.assert_status_ok();
        let deleted: DeleteUploadResponse = response.json();
        assert!(deleted.deleted);
        assert!(app.objects.get("documents", &key).is_none());

        let snapshot: Snapshot = app.server.get("/api/portfolio").await.json();
        assert!(snapshot.cv.url.is_empty());
        assert!(snapshot.cv.file.is_none());
    }

    #[tokio::test]
    async fn test_delete_by_url() {
        let app = create_test_app().await;
        let cookie = login_cookie(&app.server).await;

        let upload: UploadResponse = app
            .server
            .post("/admin/api/uploads/projects/1/image")
            .add_header("cookie", cookie.clone())
            .multipart(form(b"GIF89a".to_vec(), "shot.gif", "image/gif"))
            .await
            .json();

        let deleted: DeleteUploadResponse = app
            .server
            .delete("/admin/api/uploads")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "url": upload.url, "kind": "project_image" }))
            .await
            .json();
        assert!(deleted.deleted);

        let inline: DeleteUploadResponse = app
            .server
            .delete("/admin/api/uploads")
            .add_header("cookie", cookie)
            .json(&json!({ "url": "data:image/gif;base64,AAAA", "kind": "project_image" }))
            .await
            .json();
        assert!(!inline.deleted);
    }
}

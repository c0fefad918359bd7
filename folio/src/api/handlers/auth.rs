use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::auth::{AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse},
    auth::{AdminInfo, AdminSession, password, session},
    config::Config,
    errors::Error,
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Login with the admin email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let Some(admin) = state.admin.as_ref() else {
        return Err(Error::Unauthenticated {
            message: Some("Admin access is not configured".to_string()),
        });
    };

    if !request.email.trim().eq_ignore_ascii_case(&admin.email) {
        return Err(invalid_credentials());
    }

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password;
    let hash = admin.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        tracing::info!("Rejected admin login");
        return Err(invalid_credentials());
    }

    let token = session::create_session_token(&admin.email, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            admin: AdminInfo {
                email: admin.email.clone(),
            },
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let cookie = cookie_with_attributes(&state.config, "", 0);

    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

/// The current admin session
#[utoipa::path(
    get,
    path = "/authentication/session",
    tag = "authentication",
    responses(
        (status = 200, description = "Authenticated", body = AdminInfo),
        (status = 401, description = "No valid session"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_session(admin: AdminSession) -> Json<AdminInfo> {
    Json(admin.into())
}

fn create_session_cookie(token: &str, config: &Config) -> String {
    cookie_with_attributes(config, token, config.auth.jwt_expiry.as_secs())
}

fn cookie_with_attributes(config: &Config, value: &str, max_age: u64) -> String {
    let session_config = &config.auth.session;
    let same_site = match session_config.cookie_same_site.to_ascii_lowercase().as_str() {
        "lax" => "Lax",
        "none" => "None",
        _ => "Strict",
    };
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}{}",
        session_config.cookie_name, value, same_site, max_age, secure
    )
}

#[cfg(test)]
mod tests {
    use crate::api::models::auth::AuthResponse;
    use crate::test_utils::{TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD, create_test_app, login_cookie};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let app = create_test_app().await;

        let response = app
            .server
            .post("/authentication/login")
            .json(&json!({ "email": TEST_ADMIN_EMAIL, "password": TEST_ADMIN_PASSWORD }))
            .await;

        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(cookie.starts_with("folio_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));

        let body: AuthResponse = response.json();
        assert_eq!(body.admin.email, TEST_ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_email() {
        let app = create_test_app().await;

        let wrong_password = app
            .server
            .post("/authentication/login")
            .json(&json!({ "email": TEST_ADMIN_EMAIL, "password": "guess" }))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        assert!(wrong_password.headers().get("set-cookie").is_none());

        let wrong_email = app
            .server
            .post("/authentication/login")
            .json(&json!({ "email": "someone@example.com", "password": TEST_ADMIN_PASSWORD }))
            .await;
        wrong_email.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_endpoint_accepts_cookie_and_bearer() {
        let app = create_test_app().await;

        app.server.get("/authentication/session").await.assert_status(StatusCode::UNAUTHORIZED);

        let cookie = login_cookie(&app.server).await;
        let response = app.server.get("/authentication/session").add_header("cookie", cookie.clone()).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "email": TEST_ADMIN_EMAIL }));

        let token = cookie.split_once('=').unwrap().1.to_string();
        app.server
            .get("/authentication/session")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_logout_expires_cookie() {
        let app = create_test_app().await;

        let response = app.server.post("/authentication/logout").await;
        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with("folio_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}

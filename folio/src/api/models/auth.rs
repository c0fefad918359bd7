use axum::{
    Json,
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AdminInfo;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub admin: AdminInfo,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Login result plus the `Set-Cookie` value carrying the session token.
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        ([(header::SET_COOKIE, self.cookie)], Json(self.auth_response)).into_response()
    }
}

pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        ([(header::SET_COOKIE, self.cookie)], Json(self.auth_response)).into_response()
    }
}

//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response envelopes
//!
//! # API Structure
//!
//! - **Public** (`/api/*`): the portfolio read model, the contact form and the notification
//!   endpoint used by the site
//! - **Authentication** (`/authentication/*`): admin login, logout and session
//! - **Admin** (`/admin/api/*`): content editing, saving, uploads and the contact inbox
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`; the rendered documentation is served at `/docs`.

pub mod handlers;
pub mod models;

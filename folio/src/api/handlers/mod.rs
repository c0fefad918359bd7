//! HTTP request handlers, organised by resource.
//!
//! - [`auth`]: admin login, logout and session lookup
//! - [`portfolio`]: the public content read model and the admin editing endpoints
//! - [`contact`]: the public contact form
//! - [`notifications`]: owner notifications and their delivery records
//! - [`messages`]: the admin contact inbox
//! - [`uploads`]: profile, project and CV uploads
//!
//! # Authentication
//!
//! Admin handlers take an [`AdminSession`](crate::auth::AdminSession) argument; requests without
//! a valid session are rejected with 401 before the handler body runs.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching status code with a
//! user-safe message. `POST /api/send-notification` is the exception and builds its own JSON
//! envelope.

pub mod auth;
pub mod contact;
pub mod messages;
pub mod notifications;
pub mod portfolio;
pub mod uploads;

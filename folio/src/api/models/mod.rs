//! Request and response bodies of the HTTP API.
//!
//! Content types ([`crate::content`]) and database records ([`crate::db::models`]) are served
//! as they are; this module holds the envelopes around them.

pub mod auth;
pub mod contact;
pub mod portfolio;
pub mod uploads;

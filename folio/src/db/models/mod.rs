//! Database record structures matching table schemas.

pub mod contact_messages;
pub mod email_notifications;
pub mod portfolio;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Triage state of a visitor message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactMessageStatus {
    New,
    Read,
    Replied,
}

impl std::fmt::Display for ContactMessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContactMessageStatus::New => "new",
            ContactMessageStatus::Read => "read",
            ContactMessageStatus::Replied => "replied",
        };
        f.write_str(s)
    }
}

/// A message submitted through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ContactMessage {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// Client address as seen by the service (first forwarded hop when proxied)
    pub ip_address: String,
    pub user_agent: String,
    pub status: ContactMessageStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContactMessageCreate {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub ip_address: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContactMessageUpdate {
    pub status: ContactMessageStatus,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactMessageFilter {
    /// Only messages in this state
    pub status: Option<ContactMessageStatus>,
    /// Only messages from this sender address
    pub email: Option<String>,
    /// Number of messages to skip
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of messages to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for ContactMessageFilter {
    fn default() -> Self {
        Self {
            status: None,
            email: None,
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl ContactMessageFilter {
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            limit: 1,
            ..Default::default()
        }
    }

    pub fn matches(&self, message: &ContactMessage) -> bool {
        self.status.is_none_or(|status| status == message.status) && self.email.as_ref().is_none_or(|email| *email == message.email)
    }
}

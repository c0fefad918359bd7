use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Delivery state of a notification email.
///
/// `Pending` is the only state with outgoing transitions: to `Sent` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        matches!(
            (self, next),
            (NotificationStatus::Pending, NotificationStatus::Sent) | (NotificationStatus::Pending, NotificationStatus::Failed)
        )
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmailNotification {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    /// Message this notification is about; unset when the lookup found none
    #[schema(value_type = Option<String>, format = "uuid")]
    pub contact_message_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub sent_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EmailNotificationCreate {
    pub contact_message_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
}

/// Terminal outcome recorded against a pending notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationResolution {
    Sent { at: DateTime<Utc> },
    Failed { error: String },
}

impl NotificationResolution {
    pub fn status(&self) -> NotificationStatus {
        match self {
            NotificationResolution::Sent { .. } => NotificationStatus::Sent,
            NotificationResolution::Failed { .. } => NotificationStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailNotificationFilter {
    /// Only notifications about this contact message
    pub contact_message_id: Option<Uuid>,
    pub status: Option<NotificationStatus>,
}

impl EmailNotificationFilter {
    pub fn matches(&self, notification: &EmailNotification) -> bool {
        self.contact_message_id
            .is_none_or(|id| notification.contact_message_id == Some(id))
            && self.status.is_none_or(|status| status == notification.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_transitions() {
        use NotificationStatus::*;

        assert!(Pending.can_transition_to(Sent));
        assert!(Pending.can_transition_to(Failed));

        for from in [Sent, Failed] {
            for to in [Pending, Sent, Failed] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
        assert!(!Pending.can_transition_to(Pending));
    }
}

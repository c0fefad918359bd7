//! In-memory [`Backend`].
//!
//! Used for `database.type: memory` and throughout the tests. Everything is lost on restart; the
//! local snapshot cache still survives. Notification transitions are validated the same way the
//! Postgres update guards them.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{
    Backend,
    errors::{DbError, Result},
    models::{
        contact_messages::{ContactMessage, ContactMessageCreate, ContactMessageFilter, ContactMessageStatus},
        email_notifications::{
            EmailNotification, EmailNotificationCreate, EmailNotificationFilter, NotificationResolution, NotificationStatus,
        },
    },
};
use crate::content::Snapshot;

#[derive(Default)]
struct Tables {
    snapshots: HashMap<String, (Value, i64)>,
    /// Insertion order; newest last
    messages: Vec<ContactMessage>,
    notifications: Vec<EmailNotification>,
}

#[derive(Clone, Default)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document as if another writer had saved it.
    pub fn put_document(&self, owner_key: &str, document: Value) {
        let mut tables = self.tables.write();
        let revision = tables.snapshots.get(owner_key).map_or(1, |(_, revision)| revision + 1);
        tables.snapshots.insert(owner_key.to_string(), (document, revision));
    }

    /// Number of snapshot writes for `owner_key` so far.
    pub fn revision(&self, owner_key: &str) -> i64 {
        self.tables.read().snapshots.get(owner_key).map_or(0, |(_, revision)| *revision)
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn load_snapshot(&self, owner_key: &str) -> Result<Option<Value>> {
        Ok(self.tables.read().snapshots.get(owner_key).map(|(document, _)| document.clone()))
    }

    async fn upsert_snapshot(&self, owner_key: &str, snapshot: &Snapshot) -> Result<i64> {
        let document = serde_json::to_value(snapshot).map_err(|e| anyhow::anyhow!("serialize snapshot: {e}"))?;
        self.put_document(owner_key, document);
        Ok(self.revision(owner_key))
    }

    async fn insert_contact_message(&self, request: &ContactMessageCreate) -> Result<ContactMessage> {
        let message = ContactMessage {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            subject: request.subject.clone(),
            message: request.message.clone(),
            ip_address: request.ip_address.clone(),
            user_agent: request.user_agent.clone(),
            status: ContactMessageStatus::New,
            created_at: Utc::now(),
        };
        self.tables.write().messages.push(message.clone());
        Ok(message)
    }

    async fn latest_contact_message_id(&self, email: &str) -> Result<Option<Uuid>> {
        let tables = self.tables.read();
        Ok(tables.messages.iter().rev().find(|m| m.email == email).map(|m| m.id))
    }

    async fn list_contact_messages(&self, filter: &ContactMessageFilter) -> Result<Vec<ContactMessage>> {
        let tables = self.tables.read();
        Ok(tables
            .messages
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_contact_message_status(&self, id: Uuid, status: ContactMessageStatus) -> Result<ContactMessage> {
        let mut tables = self.tables.write();
        let message = tables.messages.iter_mut().find(|m| m.id == id).ok_or(DbError::NotFound)?;
        message.status = status;
        Ok(message.clone())
    }

    async fn insert_notification(&self, request: &EmailNotificationCreate) -> Result<EmailNotification> {
        let mut tables = self.tables.write();

        if let Some(message_id) = request.contact_message_id
            && !tables.messages.iter().any(|m| m.id == message_id)
        {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("email_notifications_contact_message_id_fkey".to_string()),
                table: Some("email_notifications".to_string()),
                message: format!("contact message {message_id} does not exist"),
            });
        }

        let notification = EmailNotification {
            id: Uuid::new_v4(),
            contact_message_id: request.contact_message_id,
            recipient_email: request.recipient_email.clone(),
            subject: request.subject.clone(),
            status: NotificationStatus::Pending,
            error_message: None,
            sent_at: None,
            created_at: Utc::now(),
        };
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn resolve_notification(&self, id: Uuid, resolution: NotificationResolution) -> Result<EmailNotification> {
        let mut tables = self.tables.write();
        let notification = tables.notifications.iter_mut().find(|n| n.id == id).ok_or(DbError::NotFound)?;

        let next = resolution.status();
        if !notification.status.can_transition_to(next) {
            return Err(DbError::InvalidTransition {
                entity: "notification".to_string(),
                from: notification.status.to_string(),
                to: next.to_string(),
            });
        }

        notification.status = next;
        match resolution {
            NotificationResolution::Sent { at } => notification.sent_at = Some(at),
            NotificationResolution::Failed { error } => notification.error_message = Some(error),
        }
        Ok(notification.clone())
    }

    async fn list_notifications(&self, filter: &EmailNotificationFilter) -> Result<Vec<EmailNotification>> {
        let tables = self.tables.read();
        Ok(tables.notifications.iter().rev().filter(|n| filter.matches(n)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact(email: &str) -> ContactMessageCreate {
        ContactMessageCreate {
            name: "Visitor".into(),
            email: email.into(),
            subject: "Hello".into(),
            message: "Nice site".into(),
            ip_address: "unknown".into(),
            user_agent: "Unknown".into(),
        }
    }

    #[tokio::test]
    async fn test_snapshot_upsert_bumps_revision() {
        let backend = InMemoryBackend::new();
        assert!(backend.load_snapshot("owner").await.unwrap().is_none());

        let snapshot = Snapshot::default();
        assert_eq!(backend.upsert_snapshot("owner", &snapshot).await.unwrap(), 1);
        assert_eq!(backend.upsert_snapshot("owner", &snapshot).await.unwrap(), 2);

        let stored = backend.load_snapshot("owner").await.unwrap().unwrap();
        assert_eq!(stored["profile"]["name"], json!(snapshot.profile.name));
    }

    #[tokio::test]
    async fn test_latest_message_id_and_listing_order() {
        let backend = InMemoryBackend::new();
        let first = backend.insert_contact_message(&contact("a@example.com")).await.unwrap();
        let second = backend.insert_contact_message(&contact("a@example.com")).await.unwrap();
        backend.insert_contact_message(&contact("b@example.com")).await.unwrap();

        assert_eq!(backend.latest_contact_message_id("a@example.com").await.unwrap(), Some(second.id));
        assert_eq!(backend.latest_contact_message_id("c@example.com").await.unwrap(), None);

        let listed = backend
            .list_contact_messages(&ContactMessageFilter::by_email("a@example.com"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);

        let all = backend.list_contact_messages(&ContactMessageFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id, first.id);
    }

    #[tokio::test]
    async fn test_notification_resolves_only_from_pending() {
        let backend = InMemoryBackend::new();
        let notification = backend
            .insert_notification(&EmailNotificationCreate {
                contact_message_id: None,
                recipient_email: "owner@example.com".into(),
                subject: "New Contact Form Submission: Hi".into(),
            })
            .await
            .unwrap();
        assert_eq!(notification.status, NotificationStatus::Pending);

        let sent = backend
            .resolve_notification(notification.id, NotificationResolution::Sent { at: Utc::now() })
            .await
            .unwrap();
        assert_eq!(sent.status, NotificationStatus::Sent);
        assert!(sent.sent_at.is_some());

        let err = backend
            .resolve_notification(
                notification.id,
                NotificationResolution::Failed {
                    error: "late failure".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));

        let stored = backend.list_notifications(&EmailNotificationFilter::default()).await.unwrap();
        assert_eq!(stored[0].status, NotificationStatus::Sent);
        assert!(stored[0].error_message.is_none());
    }

    #[tokio::test]
    async fn test_notification_requires_existing_message() {
        let backend = InMemoryBackend::new();
        let err = backend
            .insert_notification(&EmailNotificationCreate {
                contact_message_id: Some(Uuid::new_v4()),
                recipient_email: "owner@example.com".into(),
                subject: "s".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}

//! PostgreSQL [`Backend`] built from the table repositories.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    Backend,
    errors::Result,
    handlers::{ContactMessages, EmailNotifications, PortfolioSnapshots, Repository},
    models::{
        contact_messages::{ContactMessage, ContactMessageCreate, ContactMessageFilter, ContactMessageStatus, ContactMessageUpdate},
        email_notifications::{EmailNotification, EmailNotificationCreate, EmailNotificationFilter, NotificationResolution},
    },
};
use crate::content::Snapshot;

#[derive(Clone, Debug)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Backend for PostgresBackend {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        PortfolioSnapshots::new(&mut conn).probe().await
    }

    async fn load_snapshot(&self, owner_key: &str) -> Result<Option<Value>> {
        let mut conn = self.pool.acquire().await?;
        let row = PortfolioSnapshots::new(&mut conn).get(owner_key).await?;
        Ok(row.map(|row| row.into_document()))
    }

    async fn upsert_snapshot(&self, owner_key: &str, snapshot: &Snapshot) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let revision = PortfolioSnapshots::new(&mut tx).upsert(owner_key, snapshot).await?;
        tx.commit().await?;
        Ok(revision)
    }

    async fn insert_contact_message(&self, request: &ContactMessageCreate) -> Result<ContactMessage> {
        let mut conn = self.pool.acquire().await?;
        ContactMessages::new(&mut conn).create(request).await
    }

    async fn latest_contact_message_id(&self, email: &str) -> Result<Option<Uuid>> {
        let mut conn = self.pool.acquire().await?;
        ContactMessages::new(&mut conn).latest_id_for_email(email).await
    }

    async fn list_contact_messages(&self, filter: &ContactMessageFilter) -> Result<Vec<ContactMessage>> {
        let mut conn = self.pool.acquire().await?;
        ContactMessages::new(&mut conn).list(filter).await
    }

    async fn update_contact_message_status(&self, id: Uuid, status: ContactMessageStatus) -> Result<ContactMessage> {
        let mut conn = self.pool.acquire().await?;
        ContactMessages::new(&mut conn).update(id, &ContactMessageUpdate { status }).await
    }

    async fn insert_notification(&self, request: &EmailNotificationCreate) -> Result<EmailNotification> {
        let mut conn = self.pool.acquire().await?;
        EmailNotifications::new(&mut conn).create(request).await
    }

    async fn resolve_notification(&self, id: Uuid, resolution: NotificationResolution) -> Result<EmailNotification> {
        let mut tx = self.pool.begin().await?;
        let notification = EmailNotifications::new(&mut tx).update(id, &resolution).await?;
        tx.commit().await?;
        Ok(notification)
    }

    async fn list_notifications(&self, filter: &EmailNotificationFilter) -> Result<Vec<EmailNotification>> {
        let mut conn = self.pool.acquire().await?;
        EmailNotifications::new(&mut conn).list(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{defaults, merge::merge_over_defaults};
    use crate::db::{errors::DbError, models::email_notifications::NotificationStatus};
    use chrono::Utc;

    #[sqlx::test]
    #[test_log::test]
    async fn test_snapshot_round_trip(pool: PgPool) {
        let backend = PostgresBackend::new(pool);
        backend.ping().await.unwrap();
        assert!(backend.load_snapshot("owner").await.unwrap().is_none());

        let mut snapshot = defaults::seed();
        snapshot.contact.email = "hello@example.com".into();
        assert_eq!(backend.upsert_snapshot("owner", &snapshot).await.unwrap(), 1);
        assert_eq!(backend.upsert_snapshot("owner", &snapshot).await.unwrap(), 2);

        let document = backend.load_snapshot("owner").await.unwrap().unwrap();
        let merged = merge_over_defaults(&document);
        assert!(merged.fallbacks.is_empty());
        assert_eq!(merged.snapshot, snapshot);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_second_resolution_is_rejected(pool: PgPool) {
        let backend = PostgresBackend::new(pool);
        let notification = backend
            .insert_notification(&EmailNotificationCreate {
                contact_message_id: None,
                recipient_email: "inbox@example.com".into(),
                subject: "New Contact Form Submission: Hi".into(),
            })
            .await
            .unwrap();

        let sent = backend
            .resolve_notification(notification.id, NotificationResolution::Sent { at: Utc::now() })
            .await
            .unwrap();
        assert_eq!(sent.status, NotificationStatus::Sent);

        let err = backend
            .resolve_notification(notification.id, NotificationResolution::Failed { error: "again".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));
    }
}

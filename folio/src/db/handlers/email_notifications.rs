//! Database repository for contact notification emails.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::email_notifications::{
        EmailNotification, EmailNotificationCreate, EmailNotificationFilter, NotificationResolution, NotificationStatus,
    },
};

const COLUMNS: &str = "id, contact_message_id, recipient_email, subject, status, error_message, sent_at, created_at";

pub struct EmailNotifications<'c> {
    db: &'c mut PgConnection,
}

impl<'c> EmailNotifications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for EmailNotifications<'c> {
    type CreateRequest = EmailNotificationCreate;
    type UpdateRequest = NotificationResolution;
    type Response = EmailNotification;
    type Id = Uuid;
    type Filter = EmailNotificationFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let notification = sqlx::query_as::<_, EmailNotification>(&format!(
            r#"
            INSERT INTO email_notifications (contact_message_id, recipient_email, subject, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.contact_message_id)
        .bind(&request.recipient_email)
        .bind(&request.subject)
        .bind(NotificationStatus::Pending)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(notification)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let notification = sqlx::query_as::<_, EmailNotification>(&format!("SELECT {COLUMNS} FROM email_notifications WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(notification)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let notifications = sqlx::query_as::<_, EmailNotification>(&format!(
            r#"
            SELECT {COLUMNS} FROM email_notifications
            WHERE ($1::uuid IS NULL OR contact_message_id = $1)
              AND ($2::notification_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.contact_message_id)
        .bind(filter.status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(notifications)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM email_notifications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the delivery outcome. Only a pending notification can be resolved; the guard is
    /// part of the UPDATE so concurrent resolutions cannot both succeed.
    #[instrument(skip(self, request), fields(status = %request.status()), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (sent_at, error_message) = match request {
            NotificationResolution::Sent { at } => (Some(*at), None),
            NotificationResolution::Failed { error } => (None, Some(error.as_str())),
        };

        let updated = sqlx::query_as::<_, EmailNotification>(&format!(
            r#"
            UPDATE email_notifications
            SET status = $2, sent_at = $3, error_message = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.status())
        .bind(sent_at)
        .bind(error_message)
        .fetch_optional(&mut *self.db)
        .await?;

        if let Some(notification) = updated {
            return Ok(notification);
        }

        match self.get_by_id(id).await? {
            Some(current) => Err(DbError::InvalidTransition {
                entity: "notification".to_string(),
                from: current.status.to_string(),
                to: request.status().to_string(),
            }),
            None => Err(DbError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{handlers::ContactMessages, models::contact_messages::ContactMessageCreate};
    use chrono::Utc;
    use sqlx::PgPool;

    fn pending_for(contact_message_id: Option<Uuid>) -> EmailNotificationCreate {
        EmailNotificationCreate {
            contact_message_id,
            recipient_email: "inbox@example.com".to_string(),
            subject: "New Contact Form Submission: Hello".to_string(),
        }
    }

    async fn create_message(conn: &mut PgConnection) -> Uuid {
        ContactMessages::new(conn)
            .create(&ContactMessageCreate {
                name: "Visitor".to_string(),
                email: "visitor@example.com".to_string(),
                subject: "Hello".to_string(),
                message: "Hi".to_string(),
                ip_address: "unknown".to_string(),
                user_agent: "Unknown".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_is_pending(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let message_id = create_message(&mut conn).await;
        let mut repo = EmailNotifications::new(&mut conn);

        let created = repo.create(&pending_for(Some(message_id))).await.unwrap();
        assert_eq!(created.status, NotificationStatus::Pending);
        assert_eq!(created.contact_message_id, Some(message_id));
        assert!(created.sent_at.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_only_from_pending(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = EmailNotifications::new(&mut conn);

        let sent = repo.create(&pending_for(None)).await.unwrap();
        let resolved = repo.update(sent.id, &NotificationResolution::Sent { at: Utc::now() }).await.unwrap();
        assert_eq!(resolved.status, NotificationStatus::Sent);
        assert!(resolved.sent_at.is_some());

        let err = repo
            .update(
                sent.id,
                &NotificationResolution::Failed {
                    error: "late failure".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));
        let unchanged = repo.get_by_id(sent.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, NotificationStatus::Sent);
        assert!(unchanged.error_message.is_none());

        let failed = repo.create(&pending_for(None)).await.unwrap();
        let resolved = repo
            .update(
                failed.id,
                &NotificationResolution::Failed {
                    error: "smtp timeout".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, NotificationStatus::Failed);
        assert_eq!(resolved.error_message.as_deref(), Some("smtp timeout"));
        assert!(resolved.sent_at.is_none());

        let err = repo
            .update(failed.id, &NotificationResolution::Sent { at: Utc::now() })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_unknown_id_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = EmailNotifications::new(&mut conn);

        let err = repo
            .update(Uuid::new_v4(), &NotificationResolution::Sent { at: Utc::now() })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_message_and_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let message_id = create_message(&mut conn).await;
        let mut repo = EmailNotifications::new(&mut conn);

        let linked = repo.create(&pending_for(Some(message_id))).await.unwrap();
        let unlinked = repo.create(&pending_for(None)).await.unwrap();
        repo.update(
            unlinked.id,
            &NotificationResolution::Failed {
                error: "bounced".to_string(),
            },
        )
        .await
        .unwrap();

        let for_message = repo
            .list(&EmailNotificationFilter {
                contact_message_id: Some(message_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_message.len(), 1);
        assert_eq!(for_message[0].id, linked.id);

        let failed = repo
            .list(&EmailNotificationFilter {
                status: Some(NotificationStatus::Failed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, unlinked.id);

        assert_eq!(repo.list(&EmailNotificationFilter::default()).await.unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_message_keeps_notification(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let message_id = create_message(&mut conn).await;
        let notification = EmailNotifications::new(&mut conn).create(&pending_for(Some(message_id))).await.unwrap();

        assert!(ContactMessages::new(&mut conn).delete(message_id).await.unwrap());

        let kept = EmailNotifications::new(&mut conn).get_by_id(notification.id).await.unwrap().unwrap();
        assert_eq!(kept.contact_message_id, None);
    }
}

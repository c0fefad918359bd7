//! Database repository for contact form messages.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::contact_messages::{ContactMessage, ContactMessageCreate, ContactMessageFilter, ContactMessageStatus, ContactMessageUpdate},
};

const COLUMNS: &str = "id, name, email, subject, message, ip_address, user_agent, status, created_at";

pub struct ContactMessages<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ContactMessages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Id of the most recent message sent from `email`, if any.
    #[instrument(skip(self, email), err)]
    pub async fn latest_id_for_email(&mut self, email: &str) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM contact_messages WHERE email = $1 ORDER BY created_at DESC LIMIT 1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(id)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ContactMessages<'c> {
    type CreateRequest = ContactMessageCreate;
    type UpdateRequest = ContactMessageUpdate;
    type Response = ContactMessage;
    type Id = Uuid;
    type Filter = ContactMessageFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            r#"
            INSERT INTO contact_messages (name, email, subject, message, ip_address, user_agent, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.subject)
        .bind(&request.message)
        .bind(&request.ip_address)
        .bind(&request.user_agent)
        .bind(ContactMessageStatus::New)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(message)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!("SELECT {COLUMNS} FROM contact_messages WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(message)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let messages = sqlx::query_as::<_, ContactMessage>(&format!(
            r#"
            SELECT {COLUMNS} FROM contact_messages
            WHERE ($1::contact_message_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR email = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(filter.status)
        .bind(filter.email.as_deref())
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(messages)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(status = %request.status), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            "UPDATE contact_messages SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(request.status)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(message)
    }
}

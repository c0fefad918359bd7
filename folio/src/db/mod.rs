//! Database layer for data persistence and access.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ RemoteSync / │  (sync, notifications, admin handlers)
//! │   handlers   │
//! └──────┬───────┘
//!        │  dyn Backend
//!   ┌────┴─────────────┐
//!   ↓                  ↓
//! ┌──────────────┐  ┌────────────────┐
//! │ Postgres     │  │ InMemory       │
//! │ (repositories│  │ (tests, memory │
//! │  in handlers)│  │  database)     │
//! └──────────────┘  └────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Postgres repositories, one per table
//! - [`models`]: database records and their request and filter types
//! - [`errors`]: database-specific error types
//! - [`postgres`] / [`in_memory`]: the two [`Backend`] implementations
//!
//! # Migrations
//!
//! Migrations live in `folio/migrations` and run at startup through [`crate::migrator`]:
//!
//! ```ignore
//! folio::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod postgres;

use serde_json::Value;
use uuid::Uuid;

use crate::content::Snapshot;
use errors::Result;
use models::{
    contact_messages::{ContactMessage, ContactMessageCreate, ContactMessageFilter, ContactMessageStatus},
    email_notifications::{EmailNotification, EmailNotificationCreate, EmailNotificationFilter, NotificationResolution},
};

pub use in_memory::InMemoryBackend;
pub use postgres::PostgresBackend;

/// Everything the service persists, behind one seam.
///
/// Content is stored as a single snapshot document keyed by owner; contact messages and their
/// notification emails are ordinary rows.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Cheap query that fails when the store is unreachable.
    async fn ping(&self) -> Result<()>;

    /// The stored snapshot document for `owner_key`, or `None` when nothing has been saved yet.
    async fn load_snapshot(&self, owner_key: &str) -> Result<Option<Value>>;

    /// Insert or replace the snapshot, returning the stored revision.
    async fn upsert_snapshot(&self, owner_key: &str, snapshot: &Snapshot) -> Result<i64>;

    async fn insert_contact_message(&self, request: &ContactMessageCreate) -> Result<ContactMessage>;

    /// Id of the most recent message from `email`.
    async fn latest_contact_message_id(&self, email: &str) -> Result<Option<Uuid>>;

    /// Messages matching `filter`, newest first.
    async fn list_contact_messages(&self, filter: &ContactMessageFilter) -> Result<Vec<ContactMessage>>;

    async fn update_contact_message_status(&self, id: Uuid, status: ContactMessageStatus) -> Result<ContactMessage>;

    /// Insert a notification in the `pending` state.
    async fn insert_notification(&self, request: &EmailNotificationCreate) -> Result<EmailNotification>;

    /// Move a pending notification to `sent` or `failed`.
    ///
    /// Fails with [`errors::DbError::InvalidTransition`] when the notification is not pending.
    async fn resolve_notification(&self, id: Uuid, resolution: NotificationResolution) -> Result<EmailNotification>;

    async fn list_notifications(&self, filter: &EmailNotificationFilter) -> Result<Vec<EmailNotification>>;
}

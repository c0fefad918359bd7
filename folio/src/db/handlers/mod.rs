//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLx connection or transaction, runs the queries for one
//! table and returns records from [`crate::db::models`].
//!
//! - [`PortfolioSnapshots`]: the single content snapshot row
//! - [`ContactMessages`]: contact form submissions
//! - [`EmailNotifications`]: notification emails and their delivery state
//!
//! ```ignore
//! use folio::db::handlers::{ContactMessages, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let latest = ContactMessages::new(&mut conn).latest_id_for_email("visitor@example.com").await?;
//! ```

pub mod contact_messages;
pub mod email_notifications;
pub mod portfolio;
pub mod repository;

pub use contact_messages::ContactMessages;
pub use email_notifications::EmailNotifications;
pub use portfolio::PortfolioSnapshots;
pub use repository::Repository;

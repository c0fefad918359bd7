//! Remote persistence of content and contact messages.

use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    content::Snapshot,
    db::{Backend, errors::DbError, models::contact_messages::ContactMessageCreate},
    notifications::{ContactSubmission, Notifier},
};

/// Where a request came from, as far as the proxy headers tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// First `x-forwarded-for` hop, else `x-real-ip`, else `unknown`; user agent else `Unknown`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let ip_address = header("x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| header("x-real-ip"))
            .unwrap_or("unknown")
            .to_string();

        let user_agent = header("user-agent").unwrap_or("Unknown").to_string();

        Self { ip_address, user_agent }
    }
}

/// Gateway to the database for the content store and the contact form.
///
/// Every operation reports failure as a value rather than an error: the caller decides whether
/// to degrade to the local cache.
pub struct RemoteSync {
    backend: Arc<dyn Backend>,
    owner_key: String,
    notifier: Arc<dyn Notifier>,
}

impl RemoteSync {
    pub fn new(backend: Arc<dyn Backend>, owner_key: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            owner_key: owner_key.into(),
            notifier,
        }
    }

    #[instrument(skip(self))]
    pub async fn check_availability(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database unavailable");
                false
            }
        }
    }

    /// The stored snapshot document; `Ok(None)` when nothing has been saved yet.
    #[instrument(skip(self), fields(owner_key = %self.owner_key))]
    pub async fn load_all(&self) -> Result<Option<Value>, DbError> {
        self.backend.load_snapshot(&self.owner_key).await
    }

    #[instrument(skip_all, fields(owner_key = %self.owner_key))]
    pub async fn save_all(&self, snapshot: &Snapshot) -> bool {
        match self.backend.upsert_snapshot(&self.owner_key, snapshot).await {
            Ok(revision) => {
                debug!(revision, "Snapshot saved");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to save snapshot");
                false
            }
        }
    }

    /// Store a contact message, then notify the owner.
    ///
    /// Returns whether the message was stored. Notification failures are logged only.
    #[instrument(skip_all, fields(from = %submission.email, ip = %client.ip_address))]
    pub async fn submit_contact_message(&self, submission: &ContactSubmission, client: ClientInfo) -> bool {
        let request = ContactMessageCreate {
            name: submission.name.clone(),
            email: submission.email.clone(),
            subject: submission.subject.clone(),
            message: submission.message.clone(),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        };

        match self.backend.insert_contact_message(&request).await {
            Ok(message) => info!(message_id = %message.id, "Contact message stored"),
            Err(e) => {
                error!(error = %e, "Failed to store contact message");
                return false;
            }
        }

        if let Err(e) = self.notifier.notify(submission).await {
            warn!(error = %e, "Contact notification failed");
        }
        true
    }
}

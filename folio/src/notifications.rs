//! Contact form notifications.
//!
//! Every accepted contact message triggers a notification email to the site owner. The
//! [`NotificationService`] records the email in `email_notifications` as `pending`, hands it to
//! a [`Mailer`] after a short delay, and resolves the row to `sent` or `failed`.
//!
//! [`RemoteSync`](crate::sync::remote::RemoteSync) reaches the service through the [`Notifier`]
//! trait: in-process by default, or over HTTP ([`HttpNotifier`]) when `notifications.endpoint`
//! points at another deployment's `/api/send-notification`.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::NotificationsConfig,
    db::{
        Backend,
        models::email_notifications::{EmailNotificationCreate, NotificationResolution},
    },
    errors::Error,
};

/// A visitor's contact form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactSubmission {
    /// True when every field has non-blank content.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.subject, &self.message]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Outgoing email delivery.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error>;
}

/// Something that tells the owner about a new contact message.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &ContactSubmission) -> anyhow::Result<()>;
}

/// Result of processing one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent { notification_id: Option<Uuid> },
    Failed { notification_id: Option<Uuid>, error: String },
}

pub struct NotificationService {
    backend: Arc<dyn Backend>,
    mailer: Arc<dyn Mailer>,
    config: NotificationsConfig,
}

impl NotificationService {
    pub fn new(backend: Arc<dyn Backend>, mailer: Arc<dyn Mailer>, config: NotificationsConfig) -> Self {
        Self { backend, mailer, config }
    }

    /// Record, deliver and resolve the notification for `submission`.
    ///
    /// Database failures are logged and do not stop delivery; without a notification row there
    /// is simply nothing to resolve.
    #[instrument(skip_all, fields(from = %submission.email))]
    pub async fn process(&self, submission: &ContactSubmission) -> Delivery {
        let contact_message_id = match self.backend.latest_contact_message_id(&submission.email).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Failed to look up contact message for notification");
                None
            }
        };

        let subject = notification_subject(&submission.subject);
        let notification_id = match self
            .backend
            .insert_notification(&EmailNotificationCreate {
                contact_message_id,
                recipient_email: self.config.recipient.clone(),
                subject: subject.clone(),
            })
            .await
        {
            Ok(notification) => Some(notification.id),
            Err(e) => {
                error!(error = %e, "Failed to create notification record");
                None
            }
        };

        let body = notification_body(submission, &self.config.site_name, Utc::now());
        info!(to = %self.config.recipient, subject = %subject, body = %body, "Email notification");

        if !self.config.delivery_delay.is_zero() {
            tokio::time::sleep(self.config.delivery_delay).await;
        }

        match self.mailer.send(&self.config.recipient, &subject, &body).await {
            Ok(()) => {
                self.resolve(notification_id, NotificationResolution::Sent { at: Utc::now() }).await;
                Delivery::Sent { notification_id }
            }
            Err(e) => {
                let error = e.to_string();
                error!(error = %error, "Failed to send notification email");
                self.resolve(notification_id, NotificationResolution::Failed { error: error.clone() })
                    .await;
                Delivery::Failed { notification_id, error }
            }
        }
    }

    async fn resolve(&self, notification_id: Option<Uuid>, resolution: NotificationResolution) {
        let Some(id) = notification_id else {
            return;
        };
        if let Err(e) = self.backend.resolve_notification(id, resolution).await {
            error!(notification_id = %id, error = %e, "Failed to record notification outcome");
        }
    }
}

#[async_trait::async_trait]
impl Notifier for NotificationService {
    async fn notify(&self, submission: &ContactSubmission) -> anyhow::Result<()> {
        match self.process(submission).await {
            Delivery::Sent { .. } => Ok(()),
            Delivery::Failed { error, .. } => Err(anyhow::anyhow!(error)),
        }
    }
}

/// Forwards submissions to a remote `/api/send-notification` endpoint.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpNotifier {
    pub fn new(endpoint: Url) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl Notifier for HttpNotifier {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn notify(&self, submission: &ContactSubmission) -> anyhow::Result<()> {
        let response = self.client.post(self.endpoint.clone()).json(submission).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Notification endpoint rejected submission");
            anyhow::bail!("notification endpoint returned {status}: {body}");
        }
        Ok(())
    }
}

pub fn notification_subject(subject: &str) -> String {
    format!("New Contact Form Submission: {subject}")
}

pub fn notification_body(submission: &ContactSubmission, site_name: &str, received_at: DateTime<Utc>) -> String {
    format!(
        "New contact form submission received from your portfolio website:\n\
         \n\
         Contact Details:\n\
         Name: {name}\n\
         Email: {email}\n\
         Subject: {subject}\n\
         \n\
         Message:\n\
         {message}\n\
         \n\
         ---\n\
         Received: {received}\n\
         Source: {site_name}\n",
        name = submission.name,
        email = submission.email,
        subject = submission.subject,
        message = submission.message,
        received = received_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

//! Email delivery for contact form notifications.

use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::{
    config::{EmailConfig, EmailTransportConfig},
    errors::Error,
    notifications::Mailer,
};

pub struct EmailService {
    transport: EmailTransport,
    from: Mailbox,
    reply_to: Option<Mailbox>,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(email_config: &EmailConfig) -> Result<Self, Error> {
        let transport = match &email_config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        let from = format!("{} <{}>", email_config.from_name, email_config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let reply_to = email_config
            .reply_to
            .as_deref()
            .map(|address| address.parse::<Mailbox>())
            .transpose()
            .map_err(|e| Error::Internal {
                operation: format!("parse reply-to email: {e}"),
            })?;

        Ok(Self { transport, from, reply_to })
    }

    fn build_message(&self, to_email: &str, subject: &str, body: &str) -> Result<Message, Error> {
        let to = to_email.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;

        let mut builder = Message::builder().from(self.from.clone()).to(to).subject(subject);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })
    }
}

#[async_trait::async_trait]
impl Mailer for EmailService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error> {
        let message = self.build_message(to, subject, body)?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }
}

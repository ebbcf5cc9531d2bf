//! Mailer trait and SMTP implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use super::{Email, MailError};
use crate::config::EnvConfig;

/// Async email sending trait.
///
/// Implement this trait to provide alternative email backends (e.g., SES, Mailgun),
/// or a recording double in tests.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Configuration for SMTP mailer.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    /// SMTP server hostname.
    #[serde(rename = "smtp_host")]
    pub host: String,

    /// SMTP server port (default: 587).
    #[serde(rename = "smtp_port", default = "default_port")]
    pub port: u16,

    /// SMTP username for authentication.
    #[serde(rename = "smtp_username")]
    pub username: Option<String>,

    /// SMTP password for authentication.
    #[serde(rename = "smtp_password")]
    pub password: Option<String>,

    /// Sender address.
    #[serde(rename = "smtp_from")]
    pub from: String,

    /// TLS mode: "starttls" (default), "tls", or "none".
    #[serde(rename = "smtp_tls", default = "default_tls")]
    pub tls: String,

    /// Connection timeout in seconds (default: 10).
    #[serde(rename = "smtp_timeout", default = "default_timeout")]
    pub timeout: u64,

    #[serde(rename = "smtp_subject", default = "default_subject")]
    pub subject: String,
}

fn default_port() -> u16 {
    587
}

fn default_tls() -> String {
    "starttls".to_string()
}

fn default_timeout() -> u64 {
    10
}

pub(crate) fn default_subject() -> String {
    "New contact form submission".to_string()
}

/// SMTP-based mailer using lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a mailer from environment variables.
    ///
    /// Reads `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`,
    /// `SMTP_TLS`, `SMTP_TIMEOUT`.
    pub fn from_env() -> Result<Self, MailError> {
        let config =
            MailerConfig::from_env().map_err(|e| MailError::MissingConfig(e.to_string()))?;

        Self::from_config(config)
    }

    /// Create a mailer from explicit configuration.
    pub fn from_config(config: MailerConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from.clone()))?;

        let mut builder = match config.tls.as_str() {
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
            other => {
                return Err(MailError::MissingConfig(format!(
                    "smtp_tls must be starttls, tls or none, not {other:?}"
                )))
            }
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout)));

        match (config.username, config.password) {
            (Some(username), Some(password)) => {
                builder = builder.credentials(Credentials::new(username, password));
            }
            (None, None) => {}
            _ => {
                return Err(MailError::MissingConfig(
                    "smtp_username and smtp_password must be set together".into(),
                ))
            }
        }

        log::debug!(
            "SMTP transport {}:{} ({}) sending as {}",
            config.host,
            config.port,
            config.tls,
            from
        );

        let transport = builder.build();

        Ok(Self {
            transport: Arc::new(transport),
            from,
        })
    }

    /// Build a lettre Message from our Email type.
    pub(crate) fn build_message(&self, email: &Email) -> Result<Message, MailError> {
        let from_mailbox = email
            .from
            .as_ref()
            .map(|f| f.parse())
            .transpose()
            .map_err(|_| MailError::InvalidAddress(email.from.clone().unwrap_or_default()))?
            .unwrap_or_else(|| self.from.clone());

        let mut builder = Message::builder().from(from_mailbox);

        for to in &email.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.clone()))?;
            builder = builder.to(mailbox);
        }

        // the submitter address only passed a looser grammar check, so a reply-to
        // lettre rejects is dropped instead of failing the delivery
        if let Some(reply_to) = &email.reply_to {
            match reply_to.parse::<Mailbox>() {
                Ok(mailbox) => builder = builder.reply_to(mailbox),
                Err(e) => log::warn!("omitting reply-to {reply_to:?}: {e}"),
            }
        }

        builder = builder.subject(&email.subject);

        let html = SinglePart::html(email.html.clone());
        let message = if email.attachments.is_empty() {
            builder.singlepart(html)
        } else {
            let mut parts = MultiPart::mixed().singlepart(html);
            for attachment in &email.attachments {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| MailError::Build(format!("{}: {e}", attachment.filename)))?;
                parts = parts.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), content_type),
                );
            }
            builder.multipart(parts)
        };

        message.map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        log::info!(
            "relayed message to {} with {} attachment(s)",
            email.to.join(", "),
            email.attachments.len()
        );

        Ok(())
    }
}

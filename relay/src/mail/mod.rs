//! Email delivery of validated submissions.
//!
//! A thin layer over [lettre](https://lettre.rs): [`Email::compose`] turns a
//! [`ValidatedSubmission`](crate::ValidatedSubmission) into a message with its
//! attachments read into memory, and a [`Mailer`] transmits it. Delivery happens
//! once; a failure is reported to the caller and never retried.
//!
//! # Environment Variables
//!
//! [`SmtpMailer::from_env`] reads:
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `SMTP_HOST` | Yes | SMTP server hostname |
//! | `SMTP_PORT` | No | Port (default: 587) |
//! | `SMTP_USERNAME` | No | Username for authentication |
//! | `SMTP_PASSWORD` | No | Password for authentication |
//! | `SMTP_FROM` | Yes | Sender address |
//! | `SMTP_TLS` | No | `starttls` (default), `tls`, or `none` |
//! | `SMTP_TIMEOUT` | No | Seconds (default: 10) |
//! | `SMTP_SUBJECT` | No | Subject line of relayed messages |

mod mailer;
mod message;

pub(crate) use mailer::default_subject;
pub use mailer::{Mailer, MailerConfig, SmtpMailer};
pub use message::{Email, EmailAttachment, EmailBuilder};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("attachment {filename:?} could not be read: {source}")]
    Attachment {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SMTP error: {0}")]
    Smtp(String),
}

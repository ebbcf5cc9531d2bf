//! Email message types and builder.

use std::io::Read;

use super::MailError;
use crate::submission::ValidatedSubmission;

/// A file carried by an [`Email`], fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A complete email message ready to send.
#[derive(Debug, Clone)]
pub struct Email {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Sender address; the mailer's default sender when `None`.
    pub from: Option<String>,
    /// Optional reply-to address.
    pub reply_to: Option<String>,
    /// Email subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    pub attachments: Vec<EmailAttachment>,
}

impl Email {
    /// Create a new email builder.
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    /// Build the relayed message for a validated submission.
    ///
    /// Every attachment stream is opened, read to the end and released here, so a
    /// file that cannot be read aborts before anything reaches the transport.
    /// Replies go to the submitter.
    pub fn compose(submission: ValidatedSubmission, subject: &str) -> Result<Email, MailError> {
        let ValidatedSubmission {
            receiver,
            name,
            email,
            phone,
            message,
            attachments,
            ..
        } = submission;

        // fields were sanitized on the way in, so they are safe to embed as is
        let html = format!(
            "<p>{name}</p><br/><p>{email}</p><br/><p>{phone}</p><br/><p>{message}</p>"
        );

        let mut builder = Email::builder()
            .to(receiver)
            .reply_to(email)
            .subject(subject)
            .html(html);

        for attachment in attachments {
            let mut data = Vec::new();
            let read = attachment
                .source
                .open()
                .and_then(|mut stream| stream.read_to_end(&mut data));
            if let Err(source) = read {
                return Err(MailError::Attachment {
                    filename: attachment.filename,
                    source,
                });
            }

            builder = builder.attach(EmailAttachment {
                filename: attachment.filename,
                content_type: attachment.mime.to_string(),
                data,
            });
        }

        builder.build()
    }
}

/// Builder for constructing [`Email`] instances.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    to: Vec<String>,
    from: Option<String>,
    reply_to: Option<String>,
    subject: Option<String>,
    html: Option<String>,
    attachments: Vec<EmailAttachment>,
}

impl EmailBuilder {
    /// Add a primary recipient.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Override the mailer's default sender.
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Set the reply-to address.
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set HTML body content.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn attach(mut self, attachment: EmailAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Build the email, validating required fields.
    pub fn build(self) -> Result<Email, MailError> {
        if self.to.is_empty() {
            return Err(MailError::Build("at least one recipient required".into()));
        }

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;

        let html = self
            .html
            .ok_or_else(|| MailError::Build("body required".into()))?;

        Ok(Email {
            to: self.to,
            from: self.from,
            reply_to: self.reply_to,
            subject,
            html,
            attachments: self.attachments,
        })
    }
}

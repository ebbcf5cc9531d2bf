//! Per-request data: the raw form as received and the validated form ready to mail.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Cursor, Read};

use axum::extract::multipart::{Field, Multipart};
use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode};

use crate::catalog::Language;
use crate::error::SubmitError;
use crate::policy::{MAX_FILES, MAX_FILE_SIZE};

/// Multipart field carrying attachments.
pub const FILES_FIELD: &str = "images";

/// Something an attachment's bytes can be read from, any number of times.
///
/// Each call to `open` hands out a fresh stream; it is released when dropped.
pub trait AttachmentSource: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>>;
}

impl AttachmentSource for Bytes {
    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.as_ref())))
    }
}

impl AttachmentSource for Vec<u8> {
    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.as_slice())))
    }
}

/// A file part as the client sent it. Nothing here has been checked.
pub struct Upload {
    pub filename: String,
    /// Bytes received for this part, which may exceed what `source` holds.
    pub size: u64,
    /// Client-declared type; logged, never trusted.
    pub content_type: Option<String>,
    pub source: Box<dyn AttachmentSource>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, source: impl AttachmentSource + 'static, size: u64) -> Self {
        Upload {
            filename: filename.into(),
            size,
            content_type: None,
            source: Box::new(source),
        }
    }

    /// Upload whose declared size is the length of `data`.
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Upload::new(filename, data, size)
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("size", &self.size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// One form post, fields untouched.
#[derive(Debug, Default)]
pub struct SubmissionRequest {
    pub method: Method,
    pub lang: String,
    pub receiver: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub textarea: String,
    pub uploads: Vec<Upload>,
}

impl SubmissionRequest {
    /// Request with every field empty.
    pub fn new(method: Method) -> Self {
        SubmissionRequest {
            method,
            ..Default::default()
        }
    }

    /// Collect a multipart body.
    ///
    /// The first value of a repeated text field wins, even when empty. An `images`
    /// part with an empty filename is an unselected file input and is skipped.
    /// File parts are buffered up to [`MAX_FILE_SIZE`] and only counted past it;
    /// parts beyond [`MAX_FILES`] are counted but not kept. Either way the
    /// pipeline rejects them before reading.
    pub async fn from_multipart(method: Method, mut multipart: Multipart) -> Result<Self, SubmitError> {
        let mut request = SubmissionRequest::new(method);
        let mut seen = HashSet::new();

        while let Some(field) = multipart.next_field().await.map_err(body_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == FILES_FIELD {
                if !matches!(field.file_name(), Some(filename) if !filename.is_empty()) {
                    continue;
                }
                let keep = request.uploads.len() < MAX_FILES;
                let upload = read_upload(field, keep).await?;
                log::debug!(
                    "received file {:?} ({} bytes, declared {:?})",
                    upload.filename,
                    upload.size,
                    upload.content_type
                );
                request.uploads.push(upload);
                continue;
            }

            let slot = match name.as_str() {
                "lang" => &mut request.lang,
                "receiver" => &mut request.receiver,
                "name" => &mut request.name,
                "email" => &mut request.email,
                "phone" => &mut request.phone,
                "textarea" => &mut request.textarea,
                _ => continue,
            };

            if !seen.insert(name) {
                continue;
            }
            *slot = field.text().await.map_err(body_error)?;
        }

        Ok(request)
    }
}

async fn read_upload(mut field: Field<'_>, keep: bool) -> Result<Upload, SubmitError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_owned);

    let mut data = BytesMut::new();
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(body_error)? {
        size += chunk.len() as u64;
        if keep && size <= MAX_FILE_SIZE {
            data.extend_from_slice(&chunk);
        }
    }

    if size > MAX_FILE_SIZE {
        data.clear();
    }

    Ok(Upload {
        filename,
        size,
        content_type,
        source: Box::new(data.freeze()),
    })
}

fn body_error(err: axum::extract::multipart::MultipartError) -> SubmitError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        SubmitError::BodyTooLarge(err)
    } else {
        SubmitError::MalformedBody(err)
    }
}

/// An attachment whose content was sniffed and allowed.
pub struct ValidatedAttachment {
    pub filename: String,
    pub mime: &'static str,
    pub source: Box<dyn AttachmentSource>,
}

impl fmt::Debug for ValidatedAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedAttachment")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

/// A form that passed every check, with sanitized fields. Only ever built whole.
#[derive(Debug)]
pub struct ValidatedSubmission {
    pub lang: Language,
    pub receiver: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub attachments: Vec<ValidatedAttachment>,
}

use std::io;

use axum::extract::multipart::MultipartError;
use http::Method;

use crate::catalog::MessageCode;
use crate::mail::MailError;
use crate::HttpError;

/// Why a submission was turned away.
///
/// `Display` carries detail for the operator log. Clients only ever see the
/// localized text for `message_code()`.
#[derive(Debug, thiserror::Error, HttpError)]
pub enum SubmitError {
    #[error("method {0} is not supported")]
    #[http_error(METHOD_NOT_ALLOWED, MessageCode::MethodNotSupported)]
    MethodNotSupported(Method),

    #[error("receiver {0:?} is not allow-listed")]
    #[http_error(BAD_REQUEST, MessageCode::WrongReceiver)]
    WrongReceiver(String),

    #[error("name is empty")]
    #[http_error(BAD_REQUEST, MessageCode::NameRequired)]
    NameRequired,

    #[error("email is empty")]
    #[http_error(BAD_REQUEST, MessageCode::EmailRequired)]
    EmailRequired,

    #[error("{0:?} is not an email address")]
    #[http_error(BAD_REQUEST, MessageCode::EmailIncorrect)]
    EmailIncorrect(String),

    #[error("phone is empty")]
    #[http_error(BAD_REQUEST, MessageCode::PhoneRequired)]
    PhoneRequired,

    #[error("message has {chars} characters")]
    #[http_error(BAD_REQUEST, MessageCode::MessageTooLong)]
    MessageTooLong { chars: usize },

    #[error("{0} files attached")]
    #[http_error(BAD_REQUEST, MessageCode::TooManyFiles)]
    TooManyFiles(usize),

    #[error("file {filename:?} is {size} bytes")]
    #[http_error(PAYLOAD_TOO_LARGE, MessageCode::FileSize)]
    FileSize { filename: String, size: u64 },

    #[error("file {filename:?} could not be opened: {source}")]
    #[http_error(INTERNAL_SERVER_ERROR, MessageCode::FileCantOpen)]
    FileCantOpen {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("file {filename:?} could not be read: {source}")]
    #[http_error(BAD_REQUEST, MessageCode::FileCantRead)]
    FileCantRead {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("file {filename:?} has only {len} bytes")]
    #[http_error(BAD_REQUEST, MessageCode::FileTooSmall)]
    FileTooSmall { filename: String, len: usize },

    #[error("file {filename:?} has no recognizable signature")]
    #[http_error(BAD_REQUEST, MessageCode::UnknownFileType)]
    UnknownFileType { filename: String },

    #[error("file {filename:?} is {mime}")]
    #[http_error(BAD_REQUEST, MessageCode::UnsupportedFile)]
    UnsupportedFile { filename: String, mime: &'static str },

    #[error("request body exceeds the size limit: {0}")]
    #[http_error(PAYLOAD_TOO_LARGE, MessageCode::FileSize)]
    BodyTooLarge(#[source] MultipartError),

    #[error("malformed multipart body: {0}")]
    #[http_error(BAD_REQUEST, MessageCode::FileCantRead)]
    MalformedBody(#[source] MultipartError),

    #[error("mail delivery failed: {0}")]
    #[http_error(INTERNAL_SERVER_ERROR, MessageCode::EmailFail)]
    EmailFail(#[from] MailError),
}

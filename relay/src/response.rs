use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde::Serialize;

use crate::catalog::{Catalog, Language, MessageCode};
use crate::error::SubmitError;
use crate::pipeline::Rejected;

/// Body sent back for every submission: exactly one of `success` or `error`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody<'a> {
    Success(&'a str),
    Error(&'a str),
}

/// How one submission ended. Rendered exactly once.
#[derive(Debug)]
pub struct Outcome {
    lang: Language,
    result: Result<MessageCode, SubmitError>,
}

impl Outcome {
    pub fn success(lang: Language) -> Self {
        Outcome {
            lang,
            result: Ok(MessageCode::FormSuccess),
        }
    }

    pub fn failure(lang: Language, error: SubmitError) -> Self {
        Outcome {
            lang,
            result: Err(error),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.result {
            Ok(_) => StatusCode::OK,
            Err(error) => error.http_code(),
        }
    }

    pub fn code(&self) -> MessageCode {
        match &self.result {
            Ok(code) => *code,
            Err(error) => error.message_code(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.lang
    }

    pub fn error(&self) -> Option<&SubmitError> {
        self.result.as_ref().err()
    }

    /// JSON response with the message for this outcome's code in its language.
    pub fn render(&self, catalog: &Catalog) -> Response {
        let status = self.status();
        let message = catalog.message(&self.lang, self.code());
        self.log(status);

        let body = if status.is_success() {
            ResponseBody::Success(message)
        } else {
            ResponseBody::Error(message)
        };

        match serde_json::to_vec(&body) {
            Ok(json) => (
                status,
                [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                json,
            )
                .into_response(),
            Err(e) => {
                log::error!("failed to encode response: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode response").into_response()
            }
        }
    }

    fn log(&self, status: StatusCode) {
        match &self.result {
            Ok(code) => log::info!("{status} {code} [{}]", self.lang),
            // server-side failures carry detail the client never sees
            Err(error) if status.is_server_error() => {
                log::error!("{status} {}: {error}", error.message_code())
            }
            Err(error) => log::debug!("{status} {}: {error}", error.message_code()),
        }
    }
}

impl From<Rejected> for Outcome {
    fn from(rejected: Rejected) -> Self {
        Outcome::failure(rejected.lang, rejected.error)
    }
}

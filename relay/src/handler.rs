use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::response::Response;

use crate::catalog::Language;
use crate::mail::{default_subject, Email, MailError, Mailer};
use crate::pipeline::{check_method, Pipeline};
use crate::policy::FormConfig;
use crate::response::Outcome;
use crate::sanitize::{HtmlSanitizer, Sanitizer};
use crate::sniff::{MagicSniffer, Sniffer};
use crate::submission::{SubmissionRequest, ValidatedSubmission};
use crate::SubmitError;

/// Shared, read-only context of every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FormConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub sanitizer: Arc<dyn Sanitizer>,
    pub sniffer: Arc<dyn Sniffer>,
    pub subject: Arc<str>,
}

impl AppState {
    /// State with the ammonia sanitizer and magic-number sniffer.
    pub fn new(config: FormConfig, mailer: impl Mailer) -> Self {
        AppState {
            config: Arc::new(config),
            mailer: Arc::new(mailer),
            sanitizer: Arc::new(HtmlSanitizer),
            sniffer: Arc::new(MagicSniffer),
            subject: default_subject().into(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer) -> Self {
        self.sanitizer = Arc::new(sanitizer);
        self
    }

    pub fn with_sniffer(mut self, sniffer: impl Sniffer) -> Self {
        self.sniffer = Arc::new(sniffer);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<Arc<str>>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.config, self.sanitizer.as_ref(), self.sniffer.as_ref())
    }
}

/// `/upload`: any method is routed here so that the wrong ones get a coded answer.
pub async fn upload(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    if let Err(error) = check_method(&method) {
        return Outcome::failure(Language::fallback(), error).render(&state.config.messages);
    }

    let submission = match Multipart::from_request(request, &state).await {
        Ok(multipart) => match SubmissionRequest::from_multipart(method, multipart).await {
            Ok(submission) => submission,
            Err(error) => {
                return Outcome::failure(Language::fallback(), error)
                    .render(&state.config.messages)
            }
        },
        Err(rejection) => {
            log::debug!("reading non-multipart body as an empty form: {rejection}");
            SubmissionRequest::new(method)
        }
    };

    submit(&state, submission).await.render(&state.config.messages)
}

/// Validate a submission and, once every check passed, mail it.
pub async fn submit(state: &AppState, request: SubmissionRequest) -> Outcome {
    let submission = match state.pipeline().validate(request) {
        Ok(submission) => submission,
        Err(rejected) => return rejected.into(),
    };

    let lang = submission.lang.clone();
    match deliver(state, submission).await {
        Ok(()) => Outcome::success(lang),
        Err(e) => Outcome::failure(lang, SubmitError::EmailFail(e)),
    }
}

async fn deliver(state: &AppState, submission: ValidatedSubmission) -> Result<(), MailError> {
    let email = Email::compose(submission, &state.subject)?;
    state.mailer.send(&email).await
}

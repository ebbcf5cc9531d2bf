//! Ordered validation of one submission.
//!
//! Rules run in a fixed order and the first one violated decides the answer:
//!
//! 1. method is POST
//! 2. language is resolved (never fails)
//! 3. receiver is allow-listed
//! 4. name is present
//! 5. email is present, then well formed
//! 6. phone is present
//! 7. message is at most [`MAX_MESSAGE_CHARS`] characters
//! 8. at most [`MAX_FILES`] files
//! 9. each file in turn: size, open, read [`SNIFF_LEN`] bytes, sniff, allowed type
//!
//! Nothing is sent and no later rule is evaluated until every earlier rule passed.

use std::io::Read;

use email_address::EmailAddress;
use http::Method;

use crate::catalog::Language;
use crate::error::SubmitError;
use crate::policy::{FormConfig, MAX_FILES, MAX_FILE_SIZE, MAX_MESSAGE_CHARS};
use crate::sanitize::Sanitizer;
use crate::sniff::{Sniffer, SNIFF_LEN};
use crate::submission::{SubmissionRequest, Upload, ValidatedAttachment, ValidatedSubmission};

/// A rejected submission and the language to explain it in.
#[derive(Debug)]
pub struct Rejected {
    pub lang: Language,
    pub error: SubmitError,
}

pub fn check_method(method: &Method) -> Result<(), SubmitError> {
    if method == Method::POST {
        Ok(())
    } else {
        Err(SubmitError::MethodNotSupported(method.clone()))
    }
}

pub struct Pipeline<'a> {
    config: &'a FormConfig,
    sanitizer: &'a dyn Sanitizer,
    sniffer: &'a dyn Sniffer,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a FormConfig, sanitizer: &'a dyn Sanitizer, sniffer: &'a dyn Sniffer) -> Self {
        Pipeline {
            config,
            sanitizer,
            sniffer,
        }
    }

    pub fn validate(&self, request: SubmissionRequest) -> Result<ValidatedSubmission, Rejected> {
        if let Err(error) = check_method(&request.method) {
            return Err(Rejected {
                lang: Language::fallback(),
                error,
            });
        }

        let lang = self.language(&request.lang);
        match self.check(request, lang.clone()) {
            Ok(submission) => Ok(submission),
            Err(error) => Err(Rejected { lang, error }),
        }
    }

    pub fn language(&self, raw: &str) -> Language {
        self.config
            .messages
            .resolve_language(&self.sanitizer.sanitize(raw))
    }

    fn check(&self, request: SubmissionRequest, lang: Language) -> Result<ValidatedSubmission, SubmitError> {
        let receiver = self.receiver(&request.receiver)?;
        let name = self.required(&request.name, SubmitError::NameRequired)?;
        let email = self.email(&request.email)?;
        let phone = self.required(&request.phone, SubmitError::PhoneRequired)?;
        let message = self.message(&request.textarea)?;
        let attachments = self.attachments(request.uploads)?;

        Ok(ValidatedSubmission {
            lang,
            receiver,
            name,
            email,
            phone,
            message,
            attachments,
        })
    }

    fn receiver(&self, raw: &str) -> Result<String, SubmitError> {
        let receiver = self.sanitizer.sanitize(raw);
        if self.config.is_allowed_receiver(&receiver) {
            Ok(receiver)
        } else {
            Err(SubmitError::WrongReceiver(receiver))
        }
    }

    fn required(&self, raw: &str, missing: SubmitError) -> Result<String, SubmitError> {
        let value = self.sanitizer.sanitize(raw);
        if value.is_empty() {
            Err(missing)
        } else {
            Ok(value)
        }
    }

    fn email(&self, raw: &str) -> Result<String, SubmitError> {
        let email = self.required(raw, SubmitError::EmailRequired)?;
        if EmailAddress::is_valid(&email) {
            Ok(email)
        } else {
            Err(SubmitError::EmailIncorrect(email))
        }
    }

    fn message(&self, raw: &str) -> Result<String, SubmitError> {
        let message = self.sanitizer.sanitize(raw);
        let chars = message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(SubmitError::MessageTooLong { chars });
        }
        Ok(message)
    }

    fn attachments(&self, uploads: Vec<Upload>) -> Result<Vec<ValidatedAttachment>, SubmitError> {
        if uploads.len() > MAX_FILES {
            return Err(SubmitError::TooManyFiles(uploads.len()));
        }

        uploads
            .into_iter()
            .map(|upload| self.attachment(upload))
            .collect()
    }

    fn attachment(&self, upload: Upload) -> Result<ValidatedAttachment, SubmitError> {
        let Upload {
            filename,
            size,
            source,
            ..
        } = upload;

        if size > MAX_FILE_SIZE {
            return Err(SubmitError::FileSize { filename, size });
        }

        let head = {
            let stream = match source.open() {
                Ok(stream) => stream,
                Err(source) => return Err(SubmitError::FileCantOpen { filename, source }),
            };

            let mut head = Vec::with_capacity(SNIFF_LEN);
            if let Err(source) = stream.take(SNIFF_LEN as u64).read_to_end(&mut head) {
                return Err(SubmitError::FileCantRead { filename, source });
            }
            head
        };

        if head.len() < SNIFF_LEN {
            return Err(SubmitError::FileTooSmall {
                filename,
                len: head.len(),
            });
        }

        let Some(mime) = self.sniffer.sniff(&head) else {
            return Err(SubmitError::UnknownFileType { filename });
        };

        if !self.config.is_allowed_image_type(mime) {
            return Err(SubmitError::UnsupportedFile { filename, mime });
        }

        log::debug!("file {filename:?} is valid ({mime})");
        Ok(ValidatedAttachment {
            filename,
            mime,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::catalog::MessageCode;
    use crate::sanitize::HtmlSanitizer;
    use crate::sniff::MagicSniffer;
    use crate::submission::AttachmentSource;

    fn jpeg(len: usize) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(len, 0x11);
        data
    }

    fn valid() -> SubmissionRequest {
        SubmissionRequest {
            method: Method::POST,
            lang: "en".into(),
            receiver: "test@purelymail.com".into(),
            name: "John Doe".into(),
            email: "john@example.com".into(),
            phone: "123456789".into(),
            textarea: "Test message".into(),
            uploads: Vec::new(),
        }
    }

    fn run(request: SubmissionRequest) -> Result<ValidatedSubmission, Rejected> {
        let config = FormConfig::default();
        Pipeline::new(&config, &HtmlSanitizer, &MagicSniffer).validate(request)
    }

    fn code_of(request: SubmissionRequest) -> MessageCode {
        run(request).unwrap_err().error.message_code()
    }

    struct Unopenable;

    impl AttachmentSource for Unopenable {
        fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "spooled file vanished"))
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device error"))
        }
    }

    impl AttachmentSource for Broken {
        fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
            Ok(Box::new(Broken))
        }
    }

    /// Counts opens; any open would be a bug for the checks that use it.
    #[derive(Clone, Default)]
    struct Tracked(Arc<AtomicUsize>);

    impl AttachmentSource for Tracked {
        fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(io::Cursor::new(jpeg(SNIFF_LEN))))
        }
    }

    #[test]
    fn valid_form_without_files_passes() {
        let submission = run(valid()).unwrap();
        assert_eq!(submission.receiver, "test@purelymail.com");
        assert_eq!(submission.name, "John Doe");
        assert_eq!(submission.lang.as_str(), "en");
        assert!(submission.attachments.is_empty());
    }

    #[rstest]
    #[case(Method::GET)]
    #[case(Method::PUT)]
    #[case(Method::DELETE)]
    #[case(Method::OPTIONS)]
    fn other_methods_are_rejected_in_english(#[case] method: Method) {
        let rejected = run(SubmissionRequest {
            method,
            lang: "pl".into(),
            ..valid()
        })
        .unwrap_err();
        assert_eq!(rejected.error.message_code(), MessageCode::MethodNotSupported);
        assert_eq!(rejected.lang.as_str(), "en");
    }

    #[rstest]
    #[case("")]
    #[case("someone@else.com")]
    #[case("TEST@purelymail.com")]
    #[case("<b>test@purelymail.com</b>")]
    fn receivers_outside_allow_list_fail_first(#[case] receiver: &str) {
        let request = SubmissionRequest {
            receiver: receiver.into(),
            name: String::new(),
            email: "broken".into(),
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::WrongReceiver);
    }

    #[test]
    fn receiver_is_compared_after_sanitizing() {
        let request = SubmissionRequest {
            receiver: "<script>x</script>test@purelymail.com".into(),
            ..valid()
        };
        assert_eq!(run(request).unwrap().receiver, "test@purelymail.com");
    }

    #[test]
    fn field_order_decides_reported_error() {
        let request = SubmissionRequest {
            name: " ".into(),
            email: String::new(),
            phone: String::new(),
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::NameRequired);

        let request = SubmissionRequest {
            email: String::new(),
            phone: String::new(),
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::EmailRequired);

        let request = SubmissionRequest {
            phone: "<script>1</script>".into(),
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::PhoneRequired);
    }

    #[rstest]
    #[case("invalid-email")]
    #[case("john@")]
    #[case("@example.com")]
    #[case("john doe@example.com")]
    fn malformed_email_is_incorrect(#[case] email: &str) {
        let request = SubmissionRequest {
            email: email.into(),
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::EmailIncorrect);
    }

    #[test]
    fn message_limit_counts_characters() {
        let request = SubmissionRequest {
            textarea: "ż".repeat(MAX_MESSAGE_CHARS),
            ..valid()
        };
        assert!(run(request).is_ok());

        let request = SubmissionRequest {
            textarea: "a".repeat(MAX_MESSAGE_CHARS + 1),
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::MessageTooLong);
    }

    #[test]
    fn empty_message_is_allowed() {
        let request = SubmissionRequest {
            textarea: String::new(),
            ..valid()
        };
        assert_eq!(run(request).unwrap().message, "");
    }

    #[test]
    fn too_many_files_fails_before_any_open() {
        let tracked = Tracked::default();
        let uploads = (0..MAX_FILES + 1)
            .map(|i| Upload::new(format!("{i}.jpg"), tracked.clone(), SNIFF_LEN as u64))
            .collect();
        let request = SubmissionRequest { uploads, ..valid() };

        assert_eq!(code_of(request), MessageCode::TooManyFiles);
        assert_eq!(tracked.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn oversized_file_fails_before_open() {
        let tracked = Tracked::default();
        let request = SubmissionRequest {
            uploads: vec![Upload::new("big.jpg", tracked.clone(), MAX_FILE_SIZE + 1)],
            ..valid()
        };

        let rejected = run(request).unwrap_err();
        assert_eq!(rejected.error.message_code(), MessageCode::FileSize);
        assert_eq!(rejected.error.http_code().as_u16(), 413);
        assert_eq!(tracked.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn file_at_size_limit_is_accepted() {
        let request = SubmissionRequest {
            uploads: vec![Upload::new("edge.jpg", jpeg(SNIFF_LEN), MAX_FILE_SIZE)],
            ..valid()
        };
        assert!(run(request).is_ok());
    }

    #[test]
    fn unopenable_file_is_server_error() {
        let request = SubmissionRequest {
            uploads: vec![Upload::new("gone.jpg", Unopenable, 300)],
            ..valid()
        };
        let rejected = run(request).unwrap_err();
        assert_eq!(rejected.error.message_code(), MessageCode::FileCantOpen);
        assert_eq!(rejected.error.http_code().as_u16(), 500);
    }

    #[test]
    fn unreadable_file_is_client_error() {
        let request = SubmissionRequest {
            uploads: vec![Upload::new("bad.jpg", Broken, 300)],
            ..valid()
        };
        let rejected = run(request).unwrap_err();
        assert_eq!(rejected.error.message_code(), MessageCode::FileCantRead);
        assert_eq!(rejected.error.http_code().as_u16(), 400);
    }

    #[test]
    fn short_file_is_too_small() {
        let request = SubmissionRequest {
            uploads: vec![Upload::from_bytes("tiny.jpg", jpeg(SNIFF_LEN - 1))],
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::FileTooSmall);
    }

    #[test]
    fn unknown_bytes_are_unknown_type() {
        let request = SubmissionRequest {
            uploads: vec![Upload::from_bytes("notes.jpg", vec![b'x'; 1024]).content_type("image/jpeg")],
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::UnknownFileType);
    }

    #[test]
    fn renamed_pdf_is_unsupported() {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.resize(2048, b' ');
        let request = SubmissionRequest {
            uploads: vec![Upload::from_bytes("holiday.jpg", pdf).content_type("image/jpeg")],
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::UnsupportedFile);
    }

    #[test]
    fn gif_is_unsupported_by_default_policy() {
        let mut gif = b"GIF89a".to_vec();
        gif.resize(SNIFF_LEN, 0);
        let request = SubmissionRequest {
            uploads: vec![Upload::from_bytes("anim.gif", gif)],
            ..valid()
        };
        assert_eq!(code_of(request), MessageCode::UnsupportedFile);
    }

    #[test]
    fn files_are_checked_in_submission_order() {
        let request = SubmissionRequest {
            uploads: vec![
                Upload::from_bytes("ok.jpg", jpeg(400)),
                Upload::from_bytes("tiny.jpg", jpeg(10)),
                Upload::new("big.jpg", jpeg(400), MAX_FILE_SIZE + 1),
            ],
            ..valid()
        };
        let rejected = run(request).unwrap_err();
        assert!(matches!(
            rejected.error,
            SubmitError::FileTooSmall { ref filename, len: 10 } if filename == "tiny.jpg"
        ));
    }

    #[test]
    fn accepted_files_carry_sniffed_type() {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.resize(500, 0);
        let request = SubmissionRequest {
            uploads: vec![
                Upload::from_bytes("a.jpg", jpeg(SNIFF_LEN)),
                Upload::from_bytes("b.jpg", png).content_type("image/jpeg"),
            ],
            ..valid()
        };

        let submission = run(request).unwrap();
        let mimes: Vec<_> = submission.attachments.iter().map(|a| a.mime).collect();
        assert_eq!(mimes, ["image/jpeg", "image/png"]);
        assert_eq!(submission.attachments[1].filename, "b.jpg");
    }

    #[rstest]
    #[case("pl", "pl")]
    #[case("de", "de")]
    #[case("en", "en")]
    #[case("xx", "en")]
    #[case("", "en")]
    #[case("<i>pl</i>", "en")]
    fn language_resolution(#[case] raw: &str, #[case] expected: &str) {
        let rejected = run(SubmissionRequest {
            lang: raw.into(),
            receiver: String::new(),
            ..valid()
        })
        .unwrap_err();
        assert_eq!(rejected.lang.as_str(), expected);
    }

    #[test]
    fn same_invalid_field_gives_same_code_regardless_of_other_fields() {
        let variants = [
            SubmissionRequest {
                email: "nope".into(),
                ..valid()
            },
            SubmissionRequest {
                email: "nope".into(),
                textarea: "different text".into(),
                lang: "de".into(),
                ..valid()
            },
            SubmissionRequest {
                email: "nope".into(),
                name: "Jane".into(),
                phone: "+49 30 1234".into(),
                ..valid()
            },
        ];
        for request in variants {
            assert_eq!(code_of(request), MessageCode::EmailIncorrect);
        }
    }
}

//! Localized message table.
//!
//! Every response body the relay produces is looked up here by [`MessageCode`].
//! The fallback language must cover every code; other languages may be partial.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Language every lookup falls back to.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Placeholder rendered when even the fallback language lacks a code.
pub const MESSAGE_NOT_FOUND: &str = "message not found";

/// Every code the relay can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCode {
    MethodNotSupported,
    WrongReceiver,
    NameRequired,
    EmailRequired,
    EmailIncorrect,
    PhoneRequired,
    MessageTooLong,
    TooManyFiles,
    FileSize,
    FileCantOpen,
    FileCantRead,
    FileTooSmall,
    UnknownFileType,
    UnsupportedFile,
    EmailFail,
    FormSuccess,
}

impl MessageCode {
    pub const ALL: [MessageCode; 16] = [
        MessageCode::MethodNotSupported,
        MessageCode::WrongReceiver,
        MessageCode::NameRequired,
        MessageCode::EmailRequired,
        MessageCode::EmailIncorrect,
        MessageCode::PhoneRequired,
        MessageCode::MessageTooLong,
        MessageCode::TooManyFiles,
        MessageCode::FileSize,
        MessageCode::FileCantOpen,
        MessageCode::FileCantRead,
        MessageCode::FileTooSmall,
        MessageCode::UnknownFileType,
        MessageCode::UnsupportedFile,
        MessageCode::EmailFail,
        MessageCode::FormSuccess,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageCode::MethodNotSupported => "method_not_supported",
            MessageCode::WrongReceiver => "wrong_receiver",
            MessageCode::NameRequired => "name_required",
            MessageCode::EmailRequired => "email_required",
            MessageCode::EmailIncorrect => "email_incorrect",
            MessageCode::PhoneRequired => "phone_required",
            MessageCode::MessageTooLong => "message_too_long",
            MessageCode::TooManyFiles => "too_many_files",
            MessageCode::FileSize => "file_size",
            MessageCode::FileCantOpen => "file_cant_open",
            MessageCode::FileCantRead => "file_cant_read",
            MessageCode::FileTooSmall => "file_too_small",
            MessageCode::UnknownFileType => "unknown_file_type",
            MessageCode::UnsupportedFile => "unsupported_file",
            MessageCode::EmailFail => "email_fail",
            MessageCode::FormSuccess => "form_success",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A language key known to be present in the [`Catalog`] it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language(String);

impl Language {
    pub fn fallback() -> Self {
        Language(FALLBACK_LANGUAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-level lookup: language -> code -> text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    languages: HashMap<String, HashMap<MessageCode, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a language table.
    pub fn with_language<I, S>(mut self, lang: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (MessageCode, S)>,
        S: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(code, text)| (code, text.into()))
            .collect();
        self.languages.insert(lang.into(), table);
        self
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Resolve an untrusted language hint, falling back to [`FALLBACK_LANGUAGE`].
    pub fn resolve_language(&self, raw: &str) -> Language {
        if self.languages.contains_key(raw) {
            Language(raw.to_string())
        } else {
            Language::fallback()
        }
    }

    pub fn message(&self, lang: &Language, code: MessageCode) -> &str {
        self.lookup(lang.as_str(), code)
            .or_else(|| self.lookup(FALLBACK_LANGUAGE, code))
            .unwrap_or(MESSAGE_NOT_FOUND)
    }

    fn lookup(&self, lang: &str, code: MessageCode) -> Option<&str> {
        self.languages
            .get(lang)
            .and_then(|table| table.get(&code))
            .map(String::as_str)
    }

    /// The fallback language must exist and cover every [`MessageCode`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fallback = self
            .languages
            .get(FALLBACK_LANGUAGE)
            .ok_or_else(|| ConfigError::MissingLanguage(FALLBACK_LANGUAGE.to_string()))?;

        let missing: Vec<&'static str> = MessageCode::ALL
            .iter()
            .filter(|code| !fallback.contains_key(code))
            .map(|code| code.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::IncompleteCatalog {
                lang: FALLBACK_LANGUAGE.to_string(),
                missing: missing.join(", "),
            });
        }

        for (lang, table) in &self.languages {
            if table.len() < MessageCode::ALL.len() {
                log::debug!(
                    "catalog language {lang:?} covers {}/{} codes, falling back to {FALLBACK_LANGUAGE:?} for the rest",
                    table.len(),
                    MessageCode::ALL.len()
                );
            }
        }

        Ok(())
    }

    /// English, Polish and German texts.
    pub fn builtin() -> Self {
        use MessageCode::*;

        Catalog::new()
            .with_language(
                "en",
                [
                    (MethodNotSupported, "Method not supported"),
                    (WrongReceiver, "Wrong receiver"),
                    (NameRequired, "Name is required"),
                    (EmailRequired, "Email is required"),
                    (EmailIncorrect, "Email is incorrect"),
                    (PhoneRequired, "Phone number is incorrect"),
                    (MessageTooLong, "Message is too long"),
                    (TooManyFiles, "Too many files"),
                    (FileSize, "File is too big"),
                    (FileCantOpen, "File couldn't be opened"),
                    (FileCantRead, "File couldn't be read"),
                    (FileTooSmall, "File is too small to be an image"),
                    (UnknownFileType, "Unknown file type"),
                    (UnsupportedFile, "Unsupported file type"),
                    (EmailFail, "Error while trying to send email"),
                    (FormSuccess, "Form sent successfully"),
                ],
            )
            .with_language(
                "pl",
                [
                    (MethodNotSupported, "Metoda nie wspierana"),
                    (WrongReceiver, "Nieprawidłowy odbiorca"),
                    (NameRequired, "Imię jest wymagane"),
                    (EmailRequired, "Email jest wymagany"),
                    (EmailIncorrect, "Email jest nieprawidłowy"),
                    (PhoneRequired, "Numer telefonu jest nieprawidłowy"),
                    (MessageTooLong, "Wiadomość jest za długa"),
                    (TooManyFiles, "Zbyt wiele plików"),
                    (FileSize, "Plik jest za duży"),
                    (FileCantOpen, "Nie można otworzyć pliku"),
                    (FileCantRead, "Nie można odczytać pliku"),
                    (FileTooSmall, "Plik jest za mały, aby być obrazem"),
                    (UnknownFileType, "Nieznany typ pliku"),
                    (UnsupportedFile, "Nieobsługiwany typ pliku"),
                    (EmailFail, "Błąd podczas próby wysyłania emaila"),
                    (FormSuccess, "Formularz wysłany pomyślnie"),
                ],
            )
            .with_language(
                "de",
                [
                    (MethodNotSupported, "Methode wird nicht unterstützt"),
                    (WrongReceiver, "Falscher Empfänger"),
                    (NameRequired, "Name ist erforderlich"),
                    (EmailRequired, "E-Mail ist erforderlich"),
                    (EmailIncorrect, "E-Mail ist ungültig"),
                    (PhoneRequired, "Telefonnummer ist ungültig"),
                    (MessageTooLong, "Nachricht ist zu lang"),
                    (TooManyFiles, "Zu viele Dateien"),
                    (FileSize, "Datei ist zu groß"),
                    (FileCantOpen, "Datei konnte nicht geöffnet werden"),
                    (FileCantRead, "Datei konnte nicht gelesen werden"),
                    (FileTooSmall, "Datei ist zu klein, um ein Bild zu sein"),
                    (UnknownFileType, "Unbekannter Dateityp"),
                    (UnsupportedFile, "Nicht unterstützter Dateityp"),
                    (EmailFail, "Fehler beim Versuch, eine E-Mail zu senden"),
                    (FormSuccess, "Formular erfolgreich gesendet"),
                ],
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_complete() {
        let catalog = Catalog::builtin();
        assert!(catalog.validate().is_ok());
        for lang in ["en", "pl", "de"] {
            let lang = catalog.resolve_language(lang);
            for code in MessageCode::ALL {
                assert_ne!(catalog.message(&lang, code), MESSAGE_NOT_FOUND);
            }
        }
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let catalog = Catalog::builtin();
        let lang = catalog.resolve_language("xx");
        assert_eq!(lang.as_str(), "en");
        assert_eq!(
            catalog.message(&lang, MessageCode::WrongReceiver),
            "Wrong receiver"
        );
    }

    #[test]
    fn partial_language_falls_back_per_code() {
        let catalog = Catalog::builtin()
            .with_language("fr", [(MessageCode::FormSuccess, "Formulaire envoyé")]);
        let fr = catalog.resolve_language("fr");
        assert_eq!(fr.as_str(), "fr");
        assert_eq!(
            catalog.message(&fr, MessageCode::FormSuccess),
            "Formulaire envoyé"
        );
        assert_eq!(
            catalog.message(&fr, MessageCode::NameRequired),
            "Name is required"
        );
    }

    #[test]
    fn missing_everywhere_renders_placeholder() {
        let catalog = Catalog::new().with_language("en", [(MessageCode::FormSuccess, "ok")]);
        let en = catalog.resolve_language("en");
        assert_eq!(catalog.message(&en, MessageCode::EmailFail), MESSAGE_NOT_FOUND);
    }

    #[test]
    fn validate_rejects_incomplete_fallback() {
        let catalog = Catalog::new().with_language("en", [(MessageCode::FormSuccess, "ok")]);
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteCatalog { .. }));
        assert!(err.to_string().contains("method_not_supported"));
    }

    #[test]
    fn validate_rejects_missing_fallback() {
        let catalog = Catalog::builtin();
        let only_pl = Catalog::new().with_language(
            "pl",
            MessageCode::ALL.map(|code| {
                let lang = catalog.resolve_language("pl");
                (code, catalog.message(&lang, code).to_string())
            }),
        );
        assert!(matches!(
            only_pl.validate(),
            Err(ConfigError::MissingLanguage(lang)) if lang == "en"
        ));
    }

    #[test]
    fn codes_serialize_as_snake_case() {
        for code in MessageCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn german_texts_resolve() {
        let catalog = Catalog::builtin();
        let de = catalog.resolve_language("de");
        assert_eq!(catalog.message(&de, MessageCode::TooManyFiles), "Zu viele Dateien");
        assert_eq!(catalog.message(&de, MessageCode::WrongReceiver), "Falscher Empfänger");
    }
}

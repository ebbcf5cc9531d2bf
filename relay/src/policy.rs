//! What the relay accepts and where it may deliver.

use std::collections::BTreeSet;
use std::path::Path;

use http::HeaderValue;
use serde::Deserialize;

use crate::catalog::Catalog;
use crate::config::ConfigError;

/// Most files accepted in one submission.
pub const MAX_FILES: usize = 3;

/// Largest accepted attachment, in bytes.
pub const MAX_FILE_SIZE: u64 = 10 << 20;

/// Longest accepted message, in characters after sanitizing.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Immutable policy shared by every request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub allowed_image_types: BTreeSet<String>,
    pub allowed_receivers: BTreeSet<String>,
    pub messages: Catalog,
    /// Only consumed by the CORS layer.
    pub allowed_origins: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            allowed_image_types: ["image/jpeg", "image/png", "image/webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_receivers: [
                "mateusz.chodacki@gmail.com",
                "office@gmtechnics.com",
                "customsteel.electroworks@gmail.com",
                "test@purelymail.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            messages: Catalog::builtin(),
            allowed_origins: vec![
                "http://localhost:4321".to_string(),
                "https://www.custom-steel.eu".to_string(),
            ],
        }
    }
}

impl FormConfig {
    /// Load a policy file; the format follows the extension (toml, json, yaml).
    ///
    /// Keys absent from the file keep their built-in values. A `messages` table
    /// replaces the built-in catalog as a whole.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let c = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        let form_config: FormConfig = c.try_deserialize()?;
        form_config.validate()?;
        Ok(form_config)
    }

    /// Startup checks; a policy that fails here must not be served.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.messages.validate()?;

        if self.allowed_receivers.is_empty() {
            return Err(ConfigError::NoReceivers);
        }

        self.origin_headers().map(|_| ())
    }

    pub fn is_allowed_receiver(&self, receiver: &str) -> bool {
        self.allowed_receivers.contains(receiver)
    }

    pub fn is_allowed_image_type(&self, mime: &str) -> bool {
        self.allowed_image_types.contains(mime)
    }

    pub fn origin_headers(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect()
    }
}

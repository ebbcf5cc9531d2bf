use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("message catalog has no {0:?} language")]
    MissingLanguage(String),

    #[error("message catalog language {lang:?} is missing codes: {missing}")]
    IncompleteCatalog { lang: String, missing: String },

    #[error("receiver allow-list is empty")]
    NoReceivers,

    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),
}

/// Deserialize any config struct from the process environment.
///
/// Keys are matched case-insensitively, so `SMTP_HOST` fills a field named `smtp_host`.
pub trait EnvConfig: Sized {
    fn from_env() -> Result<Self, ConfigError>;
    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError>;
}

impl<D> EnvConfig for D
where
    D: DeserializeOwned,
{
    fn from_env() -> Result<Self, ConfigError> {
        let c = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Ok(c.try_deserialize()?)
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let c = config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix))
            .build()?;
        Ok(c.try_deserialize()?)
    }
}

/// Load `.env` from the working directory if there is one.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("ignoring unreadable .env file: {e}"),
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional policy file overriding the built-in [`FormConfig`](crate::FormConfig).
    #[serde(default)]
    pub form_config: Option<PathBuf>,

    /// Upper bound on a whole request body, attachments included.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Seconds before an in-flight request is abandoned.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    64 << 20
}

fn default_request_timeout() -> u64 {
    30
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            form_config: None,
            max_body_bytes: default_max_body_bytes(),
            request_timeout: default_request_timeout(),
        }
    }
}

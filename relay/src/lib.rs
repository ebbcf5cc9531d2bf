//! Contact-form relay: validates a multipart submission and forwards it by email
//! to one of a few allow-listed receivers.
//!
//! ```ignore
//! let state = AppState::new(FormConfig::default(), SmtpMailer::from_env()?);
//! let app = formrelay::router(state, &ServerConfig::default())?;
//! formrelay::serve((Ipv4Addr::UNSPECIFIED, 8080), app).await?;
//! ```

pub use formrelay_macros::HttpError;

pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod mail;
pub mod pipeline;
pub mod policy;
pub mod response;
pub mod routing;
pub mod sanitize;
pub mod serve;
pub mod sniff;
pub mod submission;

pub use catalog::{Catalog, Language, MessageCode};
pub use config::{ConfigError, EnvConfig, ServerConfig};
pub use error::SubmitError;
pub use handler::{submit, AppState};
pub use policy::FormConfig;
pub use response::Outcome;
pub use routing::router;
pub use serve::serve;
pub use submission::{SubmissionRequest, Upload, ValidatedSubmission};

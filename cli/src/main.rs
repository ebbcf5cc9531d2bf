use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use formrelay::config::load_dotenv;
use formrelay::mail::{MailerConfig, SmtpMailer};
use formrelay::{AppState, EnvConfig, FormConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "formrelay", about = "Relay contact form submissions to email")]
struct Cli {
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Port to listen on, overriding PORT.
    #[arg(short, long)]
    port: Option<u16>,

    /// Policy file with receivers, image types, messages and origins, overriding FORM_CONFIG.
    #[arg(long, value_name = "FILE")]
    form_config: Option<PathBuf>,

    /// Load and validate the configuration, then exit.
    #[arg(long, default_value_t = false)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("initializing logger")?;

    load_dotenv();

    let mut server = ServerConfig::from_env().context("reading server settings")?;
    if let Some(port) = cli.port {
        server.port = port;
    }
    if let Some(path) = cli.form_config {
        server.form_config = Some(path);
    }

    let form = match &server.form_config {
        Some(path) => FormConfig::from_file(path)
            .with_context(|| format!("loading form policy {}", path.display()))?,
        None => {
            let form = FormConfig::default();
            form.validate().context("validating built-in form policy")?;
            form
        }
    };
    log::debug!(
        "{} receiver(s), {} image type(s), languages: {}",
        form.allowed_receivers.len(),
        form.allowed_image_types.len(),
        form.messages.languages().collect::<Vec<_>>().join(", ")
    );

    let mailer_config = MailerConfig::from_env().context("reading SMTP settings")?;
    let subject = mailer_config.subject.clone();
    let mailer = SmtpMailer::from_config(mailer_config).context("configuring SMTP transport")?;

    let state = AppState::new(form, mailer).with_subject(subject);
    let router = formrelay::router(state, &server).context("building router")?;

    if cli.check {
        log::info!("configuration is valid");
        return Ok(());
    }

    formrelay::serve((Ipv4Addr::UNSPECIFIED, server.port), router)
        .await
        .with_context(|| format!("serving on port {}", server.port))
}

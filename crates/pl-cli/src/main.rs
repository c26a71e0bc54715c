//! pairlink CLI
//!
//! Single binary for the three session operations:
//! - `--login` pairs this machine by scanning a QR code
//! - `--send --phone=<number> --message=<text>` delivers one message
//! - `--logout` unlinks this machine

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pairlink::commands::{self, Action, USAGE};
use pairlink::output::{print_error, ConsoleMessageHandler, QrRenderer};
use pl_core::config::{self, ClientConfig};
use pl_core::CredentialStore;
use pl_session::{BridgeConfig, BridgeConnector, PairingSettings, SessionManager, SessionSettings};

#[derive(Parser)]
#[command(name = "pairlink")]
#[command(author, version, about = "Pair this machine with a messaging account and send messages")]
struct Cli {
    /// Pair this machine (shows a QR code when not logged in)
    #[arg(long)]
    login: bool,

    /// Send a text message
    #[arg(long)]
    send: bool,

    /// Recipient phone number, international format without spaces
    #[arg(long, value_name = "NUMBER")]
    phone: Option<String>,

    /// Message text
    #[arg(long, value_name = "MSG")]
    message: Option<String>,

    /// Unlink this machine and remove local credentials
    #[arg(long)]
    logout: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the credential database (overrides config)
    #[arg(long, env = "PAIRLINK_SESSION_DIR")]
    session_dir: Option<PathBuf>,

    /// Bridge address host:port (overrides config)
    #[arg(long, env = "PAIRLINK_BRIDGE")]
    bridge: Option<String>,

    /// Seconds to stay connected after a successful scan (overrides config)
    #[arg(long, value_name = "SECS")]
    grace_period: Option<u64>,

    /// Seconds to wait for the QR code to be scanned (overrides config)
    #[arg(long, value_name = "SECS")]
    pairing_timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let action = Action::select(
        cli.login,
        cli.send,
        cli.logout,
        cli.phone.clone(),
        cli.message.clone(),
    );
    let Some(action) = action else {
        println!("{}", USAGE);
        return Ok(());
    };

    if let Action::Send { phone, message } = &action {
        if phone.trim().is_empty() || message.is_empty() {
            print_error("Phone and message are required for send");
            return Ok(());
        }
    }

    let config = load_client_config(&cli)?;
    tracing::debug!("Running {} with {:?}", action.name(), config);

    let store = CredentialStore::open(&config.session_dir, &config.database_file)
        .await
        .with_context(|| format!("Cannot open session storage at {:?}", config.database_path()))?;

    let manager = SessionManager::new(
        store.clone(),
        BridgeConnector::new(BridgeConfig::from_client_config(&config)),
        Arc::new(QrRenderer),
        Arc::new(ConsoleMessageHandler),
        SessionSettings {
            pairing: PairingSettings {
                timeout: config.pairing_timeout,
                grace_period: config.grace_period,
            },
            user_server: config.user_server.clone(),
        },
    );

    let result = match &action {
        Action::Login => commands::login_command(&manager).await,
        Action::Send { phone, message } => commands::send_command(&manager, phone, message).await,
        Action::Logout => commands::logout_command(&manager).await,
    };

    store.close().await;
    result
}

/// Load configuration and apply command-line overrides.
///
/// An explicit `--config` must load; a broken default file only warns.
fn load_client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config: ClientConfig = if let Some(path) = &cli.config {
        config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                ClientConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            ClientConfig::default()
        }
    };

    if let Some(dir) = &cli.session_dir {
        config.session_dir = dir.clone();
    }
    if let Some(bridge) = &cli.bridge {
        config.bridge_address = bridge.clone();
    }
    if let Some(secs) = cli.grace_period {
        config.grace_period = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.pairing_timeout {
        config.pairing_timeout = Duration::from_secs(secs);
    }

    Ok(config)
}

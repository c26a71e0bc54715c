//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;

/// Configuration for the pairlink client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Directory holding the credential database. Created on first use.
    pub session_dir: PathBuf,

    /// File name of the credential database inside `session_dir`
    pub database_file: String,

    /// Address of the messaging bridge (`host:port`)
    pub bridge_address: String,

    /// Limit for the TCP connect plus the resume handshake
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Limit for a send or revoke request to be acknowledged
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// How long a pairing session waits for the code to be scanned
    #[serde(with = "duration_secs")]
    pub pairing_timeout: Duration,

    /// Wait after pairing success before the session is treated as usable.
    ///
    /// The remote side sends no "provisioning complete" signal, so this
    /// is a fixed delay rather than a poll.
    #[serde(with = "duration_secs")]
    pub grace_period: Duration,

    /// Server appended to bare phone numbers
    pub user_server: String,

    /// Name announced when pairing (defaults to hostname)
    pub device_name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_dir: super::default_session_dir(),
            database_file: "session.db".to_string(),
            bridge_address: "127.0.0.1:5280".to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            pairing_timeout: Duration::from_secs(120),
            grace_period: Duration::from_secs(30),
            user_server: "s.whatsapp.net".to_string(),
            device_name: None,
        }
    }
}

impl ClientConfig {
    /// Get the device name, falling back to hostname
    pub fn device_name(&self) -> String {
        self.device_name
            .clone()
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().into_owned())
    }

    /// Full path of the credential database
    pub fn database_path(&self) -> PathBuf {
        self.session_dir.join(&self.database_file)
    }
}

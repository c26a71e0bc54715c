//! Configuration management for pairlink

mod client;
pub mod serde_utils;

pub use client::ClientConfig;

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// `<config_dir>/pairlink`, or `./pairlink` when the platform has none
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pairlink")
}

/// Where the config file is looked up when `--config` is not given
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Get the default directory holding the credential database
pub fn default_session_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pairlink")
        .join("session")
}

/// Read and parse a TOML configuration file.
///
/// A missing file is reported as [`ConfigError::NotFound`] so callers can
/// tell it apart from a broken one.
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

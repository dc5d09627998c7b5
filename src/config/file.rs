//! TOML configuration file loading
//!
//! Supports `~/.config/wa-bridge/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BridgeConfigFile {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Outbound webhook forwarding
    #[serde(default)]
    pub forward: ForwardFileConfig,

    /// Session sidecar connection
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingFileConfig,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Path of the send/verify webhook route
    pub webhook_path: Option<String>,

    /// Token expected by the verification challenge
    pub verify_token: Option<String>,
}

/// Webhook forwarding configuration
#[derive(Debug, Default, Deserialize)]
pub struct ForwardFileConfig {
    /// External URL receiving normalized events
    pub url: Option<String>,

    /// Forward a `message:sent` notification after each send
    pub sent_events: Option<bool>,
}

/// Session sidecar configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Base URL of the session sidecar REST API
    pub api_url: Option<String>,

    /// Event polling interval in milliseconds
    pub poll_interval_ms: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Default, Deserialize)]
pub struct LoggingFileConfig {
    /// Log level filter (e.g. "info", "debug")
    pub level: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `BridgeConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> BridgeConfigFile {
    config_file_path().map_or_else(BridgeConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files fall back to defaults with a warning.
pub fn load_from(path: &Path) -> BridgeConfigFile {
    if !path.exists() {
        return BridgeConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                BridgeConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            BridgeConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/wa-bridge/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("wa-bridge").join("config.toml"))
}

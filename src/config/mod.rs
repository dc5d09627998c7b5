//! Configuration management for the bridge

pub mod file;

use std::time::Duration;

use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default path of the send/verify webhook route
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Routes served alongside the webhook path
const RESERVED_PATHS: [&str; 2] = ["/qr", "/health"];

/// Default verification token
pub const DEFAULT_VERIFY_TOKEN: &str = "your-verify-token";

/// Default session sidecar URL
pub const DEFAULT_SESSION_API_URL: &str = "http://localhost:8085";

/// Upper bound on a single webhook POST
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Webhook forwarding configuration
    pub forward: ForwardConfig,

    /// Session sidecar configuration
    pub session: SessionConfig,

    /// Log level filter used when no `-v` flag is given
    pub log_level: String,
}

/// HTTP server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path of the send/verify webhook route
    pub webhook_path: String,

    /// Token expected by `GET <webhook_path>`
    pub verify_token: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("webhook_path", &self.webhook_path)
            .field("verify_token", &"[redacted]")
            .finish()
    }
}

/// Webhook forwarding configuration
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    /// External URL; `None` disables forwarding
    pub url: Option<String>,

    /// Bound on each POST
    pub timeout: Duration,

    /// Forward `message:sent` notifications after single sends
    pub sent_events: bool,
}

/// Session sidecar configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the sidecar REST API
    pub api_url: String,

    /// How often the sidecar is polled for events
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: DEFAULT_PORT,
                webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
                verify_token: DEFAULT_VERIFY_TOKEN.to_string(),
            },
            forward: ForwardConfig {
                url: None,
                timeout: FORWARD_TIMEOUT,
                sent_events: false,
            },
            session: SessionConfig {
                api_url: DEFAULT_SESSION_API_URL.to_string(),
                poll_interval: Duration::from_millis(1000),
            },
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the optional TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Merge configuration sources: env > toml > default
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn from_sources(
        fc: file::BridgeConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let port = match env("WEBHOOK_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid WEBHOOK_PORT: {raw}")))?,
            None => fc.server.port.unwrap_or(defaults.server.port),
        };

        let webhook_path = env("WEBHOOK_PATH")
            .or(fc.server.webhook_path)
            .unwrap_or(defaults.server.webhook_path);
        if !webhook_path.starts_with('/') {
            return Err(Error::Config(format!(
                "webhook path must start with '/': {webhook_path}"
            )));
        }
        if RESERVED_PATHS.contains(&webhook_path.as_str()) {
            return Err(Error::Config(format!(
                "webhook path collides with a built-in route: {webhook_path}"
            )));
        }

        let verify_token = env("VERIFY_TOKEN")
            .or(fc.server.verify_token)
            .unwrap_or(defaults.server.verify_token);

        // Empty string means "not configured"
        let forward_url = env("FORWARD_WEBHOOK_URL")
            .or(fc.forward.url)
            .filter(|u| !u.trim().is_empty());
        if let Some(url) = &forward_url {
            url::Url::parse(url)
                .map_err(|e| Error::Config(format!("invalid FORWARD_WEBHOOK_URL {url}: {e}")))?;
        }

        let sent_events = env("FORWARD_SENT_EVENTS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .or(fc.forward.sent_events)
            .unwrap_or(false);

        let api_url = env("SESSION_API_URL")
            .or(fc.session.api_url)
            .unwrap_or(defaults.session.api_url);

        let poll_interval = match env("SESSION_POLL_INTERVAL_MS") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("invalid SESSION_POLL_INTERVAL_MS: {raw}"))
            })?),
            None => fc.session.poll_interval_ms,
        };
        if poll_interval == Some(0) {
            return Err(Error::Config("session poll interval must be positive".to_string()));
        }
        let poll_interval = poll_interval.map_or(defaults.session.poll_interval, Duration::from_millis);

        let log_level = env("LOG_LEVEL")
            .or(fc.logging.level)
            .unwrap_or(defaults.log_level);

        Ok(Self {
            server: ServerConfig {
                port,
                webhook_path,
                verify_token,
            },
            forward: ForwardConfig {
                url: forward_url,
                timeout: FORWARD_TIMEOUT,
                sent_events,
            },
            session: SessionConfig {
                api_url: api_url.trim_end_matches('/').to_string(),
                poll_interval,
            },
            log_level,
        })
    }
}

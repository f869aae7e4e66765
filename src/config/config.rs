// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use crate::logging::LogFormat;
use crate::utils::validate_backend_url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database holding the cached profile and the client stores
    pub data_db_path: PathBuf,

    /// Festival backend base URL
    pub backend_api_url: String,

    /// Optional authentication token for backend API
    pub backend_api_key: Option<String>,

    /// Local API bind address (e.g., "127.0.0.1:8080")
    pub local_api_bind: SocketAddr,

    /// Timeout applied to every backend request, in seconds
    pub request_timeout_secs: u64,

    /// Flat fee added to a non-empty merchandise cart
    pub platform_fee: u32,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log line format ("pretty" or "json")
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("VERGE_CONFIG")
            .unwrap_or_else(|_| "config.toml".to_string());

        Self::load_from(Path::new(&config_path), |key| std::env::var(key).ok())
    }

    /// Load from `path` (defaults when it does not exist), then apply the
    /// `VERGE_*` overrides that `env` yields
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config: Config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };

        if let Some(val) = env("VERGE_DATA_DB_PATH") {
            config.data_db_path = PathBuf::from(val);
        }
        if let Some(val) = env("VERGE_BACKEND_API_URL") {
            config.backend_api_url = val;
        }
        if let Some(val) = env("VERGE_BACKEND_API_KEY") {
            config.backend_api_key = Some(val);
        }
        if let Some(val) = env("VERGE_LOCAL_API_BIND") {
            config.local_api_bind = SocketAddr::from_str(&val)?;
        }
        if let Some(val) = env("VERGE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val.parse()?;
        }
        if let Some(val) = env("VERGE_PLATFORM_FEE") {
            config.platform_fee = val.parse()?;
        }
        if let Some(val) = env("VERGE_LOG_LEVEL") {
            config.log_level = val;
        }
        if let Some(val) = env("VERGE_LOG_FORMAT") {
            config.log_format = val.parse()?;
        }

        validate_backend_url(&config.backend_api_url)?;

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_db_path: PathBuf::from("verge.db"),
            backend_api_url: String::from("http://localhost:3000"),
            backend_api_key: None,
            local_api_bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_secs: 30,
            platform_fee: 20,
            log_level: String::from("info"),
            log_format: LogFormat::Pretty,
        }
    }
}

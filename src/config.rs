//! Configuration management for the book inventory admin client

use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppResult;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `http://127.0.0.1:8000/api`
    pub base_url: String,
    /// Origin used to resolve server-relative cover image paths
    #[serde(default)]
    pub media_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Where the bearer token is persisted. Defaults to the user config dir.
    #[serde(default)]
    pub token_path: Option<PathBuf>,
    /// Keep the stored token when the API is unreachable during startup
    /// validation instead of discarding it.
    #[serde(default)]
    pub keep_token_on_network_error: bool,
}

impl SessionConfig {
    pub fn resolved_token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("book-inventory-admin")
                .join("session.json")
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> AppResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .set_default("api.base_url", ApiConfig::default().base_url)?
            .set_default("logging.level", LoggingConfig::default().level)?
            .set_default("logging.format", LoggingConfig::default().format)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // BOOK_ADMIN_API__BASE_URL, BOOK_ADMIN_SESSION__TOKEN_PATH, ...
            .add_source(
                Environment::with_prefix("BOOK_ADMIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.base_url", env::var("API_URL").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            media_base_url: None,
            timeout_secs: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: None,
            keep_token_on_network_error: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

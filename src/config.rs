//! Server configuration.
//!
//! Settings are read from `<config_dir>/arapheno/config.json` when present and
//! then overridden by environment variables:
//!
//! - `ARAPHENO_DB_PATH`: SQLite database file
//! - `ARAPHENO_BIND`: listen address (default `127.0.0.1`)
//! - `ARAPHENO_PORT`: listen port (default `3000`)
//! - `ARAPHENO_CORS_ORIGINS`: comma-separated allowed origins

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "arapheno";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Database file. `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,
    pub bind: String,
    pub port: u16,
    /// Allowed CORS origins. `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            bind: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load the config file, falling back to defaults, then apply the environment.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("ARAPHENO_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }

        if let Some(bind) = lookup("ARAPHENO_BIND") {
            self.bind = bind;
        }

        if let Some(port) = lookup("ARAPHENO_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid ARAPHENO_PORT: {}", port),
            }
        }

        if let Some(origins) = lookup("ARAPHENO_CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            self.cors_origins = (!origins.is_empty()).then_some(origins);
        }

        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

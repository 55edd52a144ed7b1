//! Server configuration
//!
//! Settings come from environment variables, falling back to defaults:
//!
//! - `CLASSIFIEDS_HOST`: Bind address (default: 127.0.0.1)
//! - `CLASSIFIEDS_PORT`: Server port (default: 3001)
//! - `CLASSIFIEDS_DB_PATH`: Database file (default: ~/.classifieds/database/classifieds.db)
//! - `CORS_ALLOW_ORIGIN`: Comma-separated allowed origins (default: local frontend ports)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            db_path: default_db_path(),
            cors_allow_origins: vec![
                "http://localhost:5173".to_string(), // Vite default
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

/// ~/.classifieds/database/classifieds.db, or ./classifieds.db without a home directory
fn default_db_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home
            .join(".classifieds")
            .join("database")
            .join("classifieds.db"),
        None => PathBuf::from("classifieds.db"),
    }
}

impl ServerConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("CLASSIFIEDS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("CLASSIFIEDS_PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid CLASSIFIEDS_PORT '{}'", port))?;
        }
        if let Some(path) = lookup("CLASSIFIEDS_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(origins) = lookup("CORS_ALLOW_ORIGIN") {
            config.cors_allow_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

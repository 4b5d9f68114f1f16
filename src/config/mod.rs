//! Configuration management
//!
//! Connection settings for the certdog API, loaded from YAML with
//! environment variable overrides:
//! 1. Default values
//! 2. Configuration file (`CERTDOG_CONFIG` or a standard location)
//! 3. Environment variables (prefixed with `CERTDOG_`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection configuration for a certdog API endpoint
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CertdogConfig {
    /// Base API URL, e.g. `https://certdog.example.com/certdog/api`
    pub url: String,
    /// Request timeout in seconds; unset means no timeout
    #[serde(default, alias = "timeout")]
    pub timeout_secs: Option<u64>,
    /// Verify the server certificate
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
    /// Additional CA bundle (PEM) trusted for the API endpoint
    #[serde(default)]
    pub ssl_ca: Option<PathBuf>,
}

fn default_url() -> String {
    "http://127.0.0.1:8081/api".to_string()
}

fn default_ssl_verify() -> bool {
    true
}

impl Default for CertdogConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: None,
            ssl_verify: default_ssl_verify(),
            ssl_ca: None,
        }
    }
}

impl CertdogConfig {
    /// Configuration for `url` with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("CERTDOG_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                tracing::debug!("Loading certdog configuration from {:?}", path);
                Self::parse_file(path)?
            }
            Some(ref path) => {
                tracing::warn!("Certdog config file not found: {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a single YAML file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::parse_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("certdog.yaml"),
            PathBuf::from("config/certdog.yaml"),
            // System config directory
            PathBuf::from("/etc/certdog/certdog.yaml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("certdog/certdog.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CERTDOG_URL") {
            self.url = url;
        }
        if let Some(timeout) = lookup("CERTDOG_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => tracing::warn!("Ignoring invalid CERTDOG_TIMEOUT_SECS: {}", timeout),
            }
        }
        if let Some(verify) = lookup("CERTDOG_SSL_VERIFY") {
            self.ssl_verify = !matches!(verify.to_lowercase().as_str(), "false" | "0" | "no");
        }
        if let Some(ca) = lookup("CERTDOG_SSL_CA") {
            self.ssl_ca = Some(PathBuf::from(ca));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            anyhow::bail!("certdog url must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("certdog url must start with http:// or https://: {}", url);
        }
        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be greater than zero when set");
        }
        Ok(())
    }
}

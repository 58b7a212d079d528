//! Configuration handling for the virascan client
//!
//! Loaded from virascan.toml; command-line flags override individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use virascan_formats::detect::{UploadPolicy, DEFAULT_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES};
use virascan_formats::fasta::ParseMode;
use virascan_gateway::http::DEFAULT_BASE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "virascan.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub fasta: FastaConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Prediction service root, e.g. http://localhost:5000
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,

    /// Accepted file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FastaConfig {
    /// Reject headers that have no sequence lines instead of dropping them
    #[serde(default)]
    pub strict_headers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Milliseconds before a notification dismisses itself; 0 keeps it
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file holding the workflow slots; ":memory:" keeps them in-process
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Models used when a prediction names none
    #[serde(default = "default_models")]
    pub default: Vec<String>,
}

// Default value functions
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_max_size() -> u64 { DEFAULT_MAX_UPLOAD_BYTES }
fn default_extensions() -> Vec<String> { DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect() }
fn default_ttl_ms() -> u64 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("virascan.db") }
fn default_models() -> Vec<String> { vec!["random_forest".to_string()] }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { base_url: default_base_url() }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size(),
            allowed_extensions: default_extensions(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { ttl_ms: default_ttl_ms() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self { default: default_models() }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, server: Option<String>, db: Option<PathBuf>) -> Self {
        if let Some(server) = server {
            self.gateway.base_url = server;
        }
        if let Some(db) = db {
            self.store.path = db;
        }
        self
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_size_bytes: self.upload.max_size_bytes,
            allowed_extensions: self
                .upload
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn parse_mode(&self) -> ParseMode {
        if self.fasta.strict_headers {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notifications.ttl_ms)
    }
}

use crate::constants;
use crate::error::{CatalogError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub root_identity: RootIdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/catalog.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LatencyConfig {
    #[serde(default = "default_latency_ms")]
    pub simulated_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            simulated_ms: default_latency_ms(),
        }
    }
}

fn default_latency_ms() -> u64 {
    constants::DEFAULT_LATENCY_MS
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default = "default_retention")]
    pub retention: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
        }
    }
}

fn default_retention() -> usize {
    constants::DEFAULT_LEDGER_RETENTION
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_limit: default_top_limit(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_top_limit() -> usize {
    constants::DEFAULT_TOP_LIMIT
}
fn default_channel_capacity() -> usize {
    64
}

/// The fixed privileged login. Kept separate from stored accounts so it can be
/// rotated or switched off without touching user records.
#[derive(Debug, Deserialize, Clone)]
pub struct RootIdentityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_root_name")]
    pub name: String,
    #[serde(default = "default_root_email")]
    pub email: String,
    #[serde(default = "default_root_password")]
    pub password: String,
}

impl Default for RootIdentityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_root_name(),
            email: default_root_email(),
            password: default_root_password(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_root_name() -> String {
    constants::ROOT_NAME.to_string()
}
fn default_root_email() -> String {
    constants::ROOT_EMAIL.to_string()
}
fn default_root_password() -> String {
    constants::ROOT_PASSWORD.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Settings used by tests: in-memory store and no artificial delay.
    pub fn for_tests() -> Self {
        let mut config = Self::default();
        config.storage.backend = StorageBackend::Memory;
        config.latency.simulated_ms = 0;
        config
    }

    fn validate(&self) -> Result<()> {
        if self.ledger.retention == 0 {
            return Err(CatalogError::Config("ledger.retention must be > 0".into()));
        }
        if self.ranking.top_limit == 0 {
            return Err(CatalogError::Config("ranking.top_limit must be > 0".into()));
        }
        if self.ranking.channel_capacity == 0 {
            return Err(CatalogError::Config(
                "ranking.channel_capacity must be > 0".into(),
            ));
        }
        if self.root_identity.enabled
            && (self.root_identity.name.trim().is_empty()
                || self.root_identity.email.trim().is_empty()
                || self.root_identity.password.is_empty())
        {
            return Err(CatalogError::Config(
                "root_identity needs a name, email and password when enabled".into(),
            ));
        }
        Ok(())
    }
}

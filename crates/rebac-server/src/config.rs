//! Configuration management.
//!
//! Configuration is layered: hardcoded defaults, then an optional YAML
//! file, then `REBAC_`-prefixed environment variables (with `__` as the
//! nested-key separator). Environment wins over file, file over defaults.
//!
//! # Example
//!
//! ```ignore
//! use rebac_server::config::RebacConfig;
//!
//! // Load from file with env overrides
//! let config = RebacConfig::load("rebac.yaml")?;
//!
//! // Or from environment only
//! let config = RebacConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rebac_domain::resolver::ResolverConfig;

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RebacConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Bootstrap settings
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

impl RebacConfig {
    /// Loads configuration from a YAML file with environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref().display().to_string();
        let config = Config::builder()
            .add_source(File::new(&path, FileFormat::Yaml))
            .add_source(Environment::with_prefix("REBAC").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("REBAC").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

/// Tuple store settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Deadline for each store call, in milliseconds. Expiry surfaces as
    /// the transient store-unavailable error.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl StorageSettings {
    /// The write deadline as a `Duration`.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

fn default_write_timeout_ms() -> u64 {
    5_000
}

/// Permission resolver settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResolverSettings {
    /// Maximum expression-evaluation depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Deadline for a single check, in milliseconds.
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            check_timeout_ms: default_check_timeout_ms(),
        }
    }
}

impl ResolverSettings {
    /// Builds the domain resolver configuration.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_max_depth(self.max_depth)
            .with_timeout(Duration::from_millis(self.check_timeout_ms))
    }
}

fn default_max_depth() -> u32 {
    16
}

fn default_check_timeout_ms() -> u64 {
    5_000
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to emit JSON-formatted log lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bootstrap settings: the single logical store of the deployment and the
/// seed admin.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BootstrapSettings {
    /// Store id. Fixed so bootstrap re-runs are idempotent.
    #[serde(default = "default_store_id")]
    pub store_id: String,

    /// Human-readable store name.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// The root organization id.
    #[serde(default = "default_root_org_id")]
    pub root_org_id: String,

    /// The user id seeded as root organization admin.
    #[serde(default = "default_root_admin_user_id")]
    pub root_admin_user_id: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            store_id: default_store_id(),
            store_name: default_store_name(),
            root_org_id: default_root_org_id(),
            root_admin_user_id: default_root_admin_user_id(),
        }
    }
}

fn default_store_id() -> String {
    "default".to_string()
}

fn default_store_name() -> String {
    "rebac".to_string()
}

fn default_root_org_id() -> String {
    "default".to_string()
}

fn default_root_admin_user_id() -> String {
    "root".to_string()
}

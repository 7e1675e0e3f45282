//! Configuration management for label serial allocation
//!
//! This module provides TOML configuration with multi-source loading and
//! zero-config defaults, converted into the runtime configuration of the
//! queue and cache stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{
    CacheConfig, CacheStore, ConflictPolicy, QueueStore, QueueStoreConfig, SerializationMode,
    Serializer,
};
use crate::constants::{files, lock, logging};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Shared queue settings
    pub queue: QueueConfigToml,
    /// Local reservation cache settings
    pub cache: CacheConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfigToml {
    /// Shared directory holding the queue documents (OS data directory if None)
    pub root: Option<PathBuf>,
    /// JBK queue document name
    pub jbk_file: String,
    /// Lot queue document name
    pub lot_file: String,
    /// How long to wait for another workstation's lock
    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,
    /// Upper bound on a single queue operation
    #[serde(with = "humantime_serde")]
    pub io_timeout: Duration,
}

impl Default for QueueConfigToml {
    fn default() -> Self {
        Self {
            root: None,
            jbk_file: files::JBK_QUEUE_FILE.to_string(),
            lot_file: files::LOT_QUEUE_FILE.to_string(),
            lock_timeout: lock::DEFAULT_LOCK_TIMEOUT,
            io_timeout: lock::DEFAULT_IO_TIMEOUT,
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Local directory for the reservation document (OS default if None)
    pub root: Option<PathBuf>,
    /// What to do when a part already holds a different number
    pub conflict_policy: ConflictPolicy,
    /// Remove the reservation document once it is empty
    pub teardown_on_empty: bool,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            root: None,
            conflict_policy: ConflictPolicy::Reject,
            teardown_on_empty: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Explicit config file (must exist)
    /// 2. First config file found in the standard locations
    /// 3. Default values
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the stores misbehave
    pub fn validate(&self) -> ConfigResult<()> {
        if self.queue.io_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "queue.io_timeout".to_string(),
                value: humantime_serde::re::humantime::format_duration(self.queue.io_timeout)
                    .to_string(),
                reason: "Must be greater than zero".to_string(),
            });
        }
        if self.queue.lock_timeout >= self.queue.io_timeout {
            return Err(ConfigError::InvalidValue {
                field: "queue.lock_timeout".to_string(),
                value: humantime_serde::re::humantime::format_duration(self.queue.lock_timeout)
                    .to_string(),
                reason: "Must be shorter than queue.io_timeout".to_string(),
            });
        }
        for (field, name) in [
            ("queue.jbk_file", &self.queue.jbk_file),
            ("queue.lot_file", &self.queue.lot_file),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: name.clone(),
                    reason: "File name cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Initialize configuration on first run
    ///
    /// Writes a commented default config file if none exists and returns its
    /// path together with whether it was created.
    pub async fn initialize_first_run() -> Result<(PathBuf, bool)> {
        let config_path = Self::get_default_config_path()?;

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        Ok((config_path, true))
    }

    /// Root directory of the shared queue documents
    pub fn queue_root(&self) -> ConfigResult<PathBuf> {
        match &self.queue.root {
            Some(root) => Ok(root.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(files::APP_DIR_NAME).join("queue"))
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "queue.root".to_string(),
                    value: String::new(),
                    reason: "No data directory on this system; set queue.root".to_string(),
                }),
        }
    }

    /// Runtime configuration for the `mode` queue
    pub fn queue_config(&self, mode: SerializationMode) -> ConfigResult<QueueStoreConfig> {
        let file_name = match mode {
            SerializationMode::Jbk => &self.queue.jbk_file,
            SerializationMode::Lot => &self.queue.lot_file,
        };

        Ok(QueueStoreConfig::new(mode, self.queue_root()?.join(file_name))
            .with_lock_timeout(self.queue.lock_timeout)
            .with_io_timeout(self.queue.io_timeout))
    }

    /// Runtime configuration for the reservation cache
    pub fn cache_config(&self) -> CacheConfig {
        self.cache.to_runtime_config()
    }

    /// Build a serializer over both queues and the local cache
    pub fn serializer(&self) -> Result<Serializer> {
        let queues = [SerializationMode::Jbk, SerializationMode::Lot]
            .into_iter()
            .map(|mode| self.queue_config(mode).map(QueueStore::new))
            .collect::<ConfigResult<Vec<_>>>()?;
        let cache = CacheStore::new(self.cache_config())?;

        Ok(Serializer::new(queues, Arc::new(cache)))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(files::LOCAL_CONFIG_FILE)];
        if let Ok(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }
        #[cfg(unix)]
        search_paths.push(PathBuf::from("/etc/label-serials/config.toml"));

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join(files::APP_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::InvalidFormat)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let default_queue_root = dirs::data_dir()
            .map(|dir| dir.join(files::APP_DIR_NAME).join("queue"))
            .unwrap_or_else(|| PathBuf::from("./queue"));
        let default_cache_root = dirs::data_local_dir()
            .map(|dir| dir.join(files::APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./cache"));

        format!(
            r#"# Label Serials Configuration
# This file was automatically generated on first run.

[queue]
# Shared directory every workstation reaches (default: {})
# root = "/mnt/production/serials"
jbk_file = "{}"
lot_file = "{}"

# How long to wait while another workstation holds a queue lock
lock_timeout = "{}"

# Upper bound on one queue operation against shared storage
io_timeout = "{}"

[cache]
# Local reservation directory (default: {})
# root = "/var/lib/label-serials"

# Reserving a different number for a part that already holds one:
# "reject" fails the call, "overwrite" replaces the held number
conflict_policy = "reject"

# Delete the reservation file once nothing is held
teardown_on_empty = true

[logging]
level = "{}"  # error, warn, info, debug, trace
"#,
            default_queue_root.display(),
            files::JBK_QUEUE_FILE,
            files::LOT_QUEUE_FILE,
            humantime_serde::re::humantime::format_duration(lock::DEFAULT_LOCK_TIMEOUT),
            humantime_serde::re::humantime::format_duration(lock::DEFAULT_IO_TIMEOUT),
            default_cache_root.display(),
            logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.root.clone(),
            conflict_policy: self.conflict_policy,
            teardown_on_empty: self.teardown_on_empty,
        }
    }
}

//! Configuration management with file persistence

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Liftlog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the sync backend
    pub base_url: String,
    /// Environment tag sent with every request (staging or production)
    pub environment: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Active-session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between periodic cache saves during an active workout
    pub autosave_interval_secs: u64,
}

/// Local storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the data directory (database + session cache)
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.liftlog.app".to_string(),
                environment: "staging".to_string(),
                timeout_secs: 30,
            },
            session: SessionConfig {
                autosave_interval_secs: 10,
            },
            storage: StorageConfig { data_dir: None },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("LIFTLOG_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("liftlog")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the data directory, honoring the configured override
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        if let Ok(custom_dir) = env::var("LIFTLOG_DATA_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }
        Ok(dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
            .join("liftlog"))
    }

    /// Load configuration from file, or return defaults if it doesn't exist
    ///
    /// Environment variables override file values: `LIFTLOG_API_URL`,
    /// `LIFTLOG_ENV`.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        if let Ok(url) = env::var("LIFTLOG_API_URL") {
            if !url.is_empty() {
                config.api.base_url = url;
            }
        }
        if let Ok(environment) = env::var("LIFTLOG_ENV") {
            if !environment.is_empty() {
                config.api.environment = environment;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.is_empty() {
            return Err(anyhow!("api.base_url must not be empty"));
        }
        if self.session.autosave_interval_secs == 0 {
            return Err(anyhow!("session.autosave_interval_secs must be at least 1"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "api.base_url" => Ok(self.api.base_url.clone()),
            "api.environment" => Ok(self.api.environment.clone()),
            "api.timeout_secs" => Ok(self.api.timeout_secs.to_string()),
            "session.autosave_interval_secs" => Ok(self.session.autosave_interval_secs.to_string()),
            "storage.data_dir" => Ok(self
                .storage
                .data_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(platform default)".to_string())),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `liftlog config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "api.base_url" => self.api.base_url = value.to_string(),
            "api.environment" => self.api.environment = value.to_string(),
            "api.timeout_secs" => {
                self.api.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout value: {}", value))?;
            }
            "session.autosave_interval_secs" => {
                self.session.autosave_interval_secs = value
                    .parse()
                    .with_context(|| format!("Invalid interval value: {}", value))?;
            }
            "storage.data_dir" => self.storage.data_dir = Some(PathBuf::from(value)),
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `liftlog config list` to see available keys.",
                    key
                ))
            }
        }
        self.validate()
    }

    /// List all configuration keys and their current values
    pub fn list(&self) -> Vec<(&'static str, String)> {
        [
            "api.base_url",
            "api.environment",
            "api.timeout_secs",
            "session.autosave_interval_secs",
            "storage.data_dir",
        ]
        .iter()
        .map(|key| (*key, self.get(key).unwrap_or_default()))
        .collect()
    }
}

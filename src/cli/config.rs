//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./epoxi.toml or ./.epoxi/config.toml
//! 2. User config: ~/.epoxi/config.toml
//! 3. System config: /etc/epoxi/config.toml
//! 4. Built-in defaults

use crate::container::DockerRuntimeConfig;
use crate::env;
use crate::fleet::FleetOptions;
use crate::notify::{Messages, NotificationConfig};
use crate::orchestration::{ContainerSettings, Timing};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config file: {0}")]
    Write(#[from] std::io::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Container engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    pub network: String,
    pub auto_pull: bool,
    pub force_stop_timeout_secs: u64,
    pub utility_image: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        let containers = ContainerSettings::default();
        Self {
            network: containers.network,
            auto_pull: true,
            force_stop_timeout_secs: 10,
            utility_image: containers.utility_image,
        }
    }
}

/// Fixed waits, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub stop_grace_secs: u64,
    pub warmup_secs: u64,
    pub survival_secs: u64,
    pub copy_wait_secs: u64,
    pub default_schedule_delay_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            stop_grace_secs: 10,
            warmup_secs: 10,
            survival_secs: 60,
            copy_wait_secs: 10,
            default_schedule_delay_secs: 5,
        }
    }
}

impl TimingConfig {
    pub fn to_timing(&self) -> Timing {
        Timing {
            stop_grace: Duration::from_secs(self.stop_grace_secs),
            warmup: Duration::from_secs(self.warmup_secs),
            survival: Duration::from_secs(self.survival_secs),
            copy_wait: Duration::from_secs(self.copy_wait_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Row store file; relative paths resolve against the working directory
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: env::store_file_path(Path::new("")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub hosts_file: Option<PathBuf>,
}

/// Complete fleet configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub docker: DockerConfig,
    pub timing: TimingConfig,
    pub notifications: NotificationConfig,
    pub messages: Messages,
    pub store: StoreConfig,
    pub proxy: ProxyConfig,
}

impl FleetConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn runtime_config(&self) -> DockerRuntimeConfig {
        DockerRuntimeConfig {
            auto_pull: self.docker.auto_pull,
            force_stop_timeout: Duration::from_secs(self.docker.force_stop_timeout_secs),
        }
    }

    pub fn fleet_options(&self) -> FleetOptions {
        FleetOptions {
            timing: self.timing.to_timing(),
            containers: ContainerSettings {
                network: self.docker.network.clone(),
                utility_image: self.docker.utility_image.clone(),
            },
            messages: self.messages.clone(),
            proxy_hosts_file: self.proxy.hosts_file.clone(),
            default_schedule_delay: Duration::from_secs(self.timing.default_schedule_delay_secs),
        }
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load `override_path` if given, otherwise discover using the hierarchy
    pub fn load(override_path: Option<&Path>) -> Result<FleetConfig, ConfigError> {
        match override_path {
            Some(path) => {
                info!("Loading configuration override from: {:?}", path);
                FleetConfig::from_toml_file(path)
            }
            None => Self::discover_config(),
        }
    }

    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<FleetConfig, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return FleetConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(FleetConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::get_config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/epoxi").join(env::CONFIG_FILE_NAME));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("epoxi")
                    .join(env::CONFIG_FILE_NAME),
            );
        }

        candidates
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Create a default config file in the user's home directory
    pub fn create_default_user_config() -> Result<PathBuf, ConfigError> {
        let home_dir = Self::get_home_dir().ok_or(ConfigError::NoHomeDir)?;

        let config_dir = env::user_config_dir_path(&home_dir);
        let config_path = env::user_config_file_path(&home_dir);

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
            info!("Created configuration directory: {:?}", config_dir);
        }

        if !config_path.exists() {
            FleetConfig::default().to_toml_file(&config_path)?;
            info!("Created default configuration file: {:?}", config_path);
        } else {
            warn!("Configuration file already exists: {:?}", config_path);
        }

        Ok(config_path)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "EXISTS"
                } else {
                    "NOT A FILE"
                }
            } else {
                "NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active configuration: {:?}", found),
            None => println!("Active configuration: Built-in defaults"),
        }
    }
}

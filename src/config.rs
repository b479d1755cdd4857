//! Configuration management
//!
//! Settings come from a TOML file (`protochain.toml`, or the path in
//! `PROTOCHAIN_CONFIG`). Every field has a default, so a missing default
//! file just yields the defaults.

use serde::Deserialize;
use thiserror::Error;

use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "protochain.toml";
const CONFIG_PATH_ENV: &str = "PROTOCHAIN_CONFIG";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub miner: MinerConfig,
    pub genesis: GenesisConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// In-process miner settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub enabled: bool,
    /// Hex or WIF key of the rewarded wallet; a fresh wallet when absent
    pub private_key: Option<String>,
    pub poll_interval_ms: u64,
}

impl MinerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            private_key: None,
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Hex or WIF key of the genesis reward recipient
    pub private_key: Option<String>,
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".to_string()));
        }

        if self.miner.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("miner.poll_interval_ms must be positive".to_string()));
        }

        Ok(())
    }
}

/// Loads the config from `PROTOCHAIN_CONFIG` or `protochain.toml`
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_config() -> Result<Config, ConfigError> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => Config::from_toml(&fs::read_to_string(path)?),
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::from_toml(&fs::read_to_string(DEFAULT_CONFIG_PATH)?)
        }
        Err(_) => Ok(Config::default()),
    }
}

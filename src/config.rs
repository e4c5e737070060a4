//! Configuration management for HashLedger

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
    #[serde(default = "default_peer_timeout")]
    pub peer_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
            peer_timeout_secs: default_peer_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    /// Recipient of block rewards. Random when unset.
    #[serde(default)]
    pub node_id: Option<String>,
    /// Upper bound on nonces tried per block; unbounded when unset.
    #[serde(default)]
    pub max_attempts: Option<u64>,
    #[serde(default = "default_commit_retries")]
    pub max_commit_retries: u32,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            max_attempts: None,
            max_commit_retries: default_commit_retries(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    5001
}

fn default_peer_timeout() -> u64 {
    5
}

fn default_commit_retries() -> u32 {
    3
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.network.api_port == 0 {
            return Err(ChainError::ConfigError("network.api_port must be non-zero".into()));
        }
        if self.network.peer_timeout_secs == 0 {
            return Err(ChainError::ConfigError(
                "network.peer_timeout_secs must be non-zero".into(),
            ));
        }
        if matches!(&self.miner.node_id, Some(id) if id.trim().is_empty()) {
            return Err(ChainError::ConfigError("miner.node_id must not be blank".into()));
        }
        Ok(())
    }
}

/// Loads `config.toml` from the working directory, falling back to defaults.
pub fn load_config() -> Result<Config, ChainError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };
    config.validate()?;
    Ok(config)
}

//! Node configuration.
//!
//! Handles loading and validation of node configuration from
//! config files and command-line arguments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vela_types::Address;

/// Node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name
    pub name: String,
    /// Data directory
    pub data_dir: PathBuf,
    /// Timestamp of the genesis block (milliseconds since epoch)
    pub genesis_timestamp: u64,
    /// Initial balance allocation, applied once on a fresh data directory
    #[serde(default)]
    pub genesis: Vec<GenesisAlloc>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Genesis allocation entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAlloc {
    pub address: Address,
    pub amount: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Emit JSON instead of the pretty format
    pub json: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "vela-node".to_string(),
            data_dir: PathBuf::from("./data"),
            genesis_timestamp: 0,
            genesis: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: NodeConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Node name cannot be empty");
        }
        for alloc in &self.genesis {
            if alloc.amount == 0 {
                anyhow::bail!("Genesis allocation for {} cannot be zero", alloc.address);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_config_with_genesis() {
        let addr = Address::from_bytes([1u8; 20]);
        let toml = format!(
            r#"
            name = "testnet-node"
            data_dir = "/tmp/vela"
            genesis_timestamp = 1474035253835

            [[genesis]]
            address = "{}"
            amount = 1000000
            "#,
            addr
        );

        let config: NodeConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config.name, "testnet-node");
        assert_eq!(config.genesis.len(), 1);
        assert_eq!(config.genesis[0].address, addr);
        assert_eq!(config.genesis[0].amount, 1_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_genesis_allocation_rejected() {
        let mut config = NodeConfig::default();
        config.genesis.push(GenesisAlloc {
            address: Address::from_bytes([1u8; 20]),
            amount: 0,
        });
        assert!(config.validate().is_err());
    }
}

//! Chain configuration
//!
//! Fork-choice limits and the block reward. Loaded from JSON; any field left
//! out takes the default from [`crate::constants`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::constants::{
    DEFAULT_COINBASE_REWARD, DEFAULT_MAX_REORG_DEPTH, DEFAULT_RETENTION_WINDOW,
};
use crate::validation::Amount;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_reorg_depth must be at least 1")]
    ZeroReorgDepth,
    #[error("retention_window ({window}) must be >= max_reorg_depth ({depth})")]
    RetentionBelowReorgDepth { window: u64, depth: u64 },
    #[error("coinbase_reward must not be negative, got {0}")]
    NegativeReward(Amount),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    max_reorg_depth: u64,
    retention_window: u64,
    coinbase_reward: Amount,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            max_reorg_depth: DEFAULT_MAX_REORG_DEPTH,
            retention_window: DEFAULT_RETENTION_WINDOW,
            coinbase_reward: DEFAULT_COINBASE_REWARD,
        }
    }
}

impl TryFrom<RawConfig> for ChainConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        ChainConfig::new(raw.max_reorg_depth, raw.retention_window, raw.coinbase_reward)
    }
}

/// Validated chain parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct ChainConfig {
    max_reorg_depth: u64,
    retention_window: u64,
    coinbase_reward: Amount,
}

impl ChainConfig {
    /// Build a configuration, requiring `1 <= max_reorg_depth <= retention_window`
    pub fn new(
        max_reorg_depth: u64,
        retention_window: u64,
        coinbase_reward: Amount,
    ) -> Result<Self, ConfigError> {
        if max_reorg_depth == 0 {
            return Err(ConfigError::ZeroReorgDepth);
        }
        if retention_window < max_reorg_depth {
            return Err(ConfigError::RetentionBelowReorgDepth {
                window: retention_window,
                depth: max_reorg_depth,
            });
        }
        if coinbase_reward < 0 {
            return Err(ConfigError::NegativeReward(coinbase_reward));
        }
        Ok(Self {
            max_reorg_depth,
            retention_window,
            coinbase_reward,
        })
    }

    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Blocks whose parent is this many heights behind the best tip are stale
    pub fn max_reorg_depth(&self) -> u64 {
        self.max_reorg_depth
    }

    /// Number of heights below the best tip kept in memory
    pub fn retention_window(&self) -> u64 {
        self.retention_window
    }

    pub fn coinbase_reward(&self) -> Amount {
        self.coinbase_reward
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_reorg_depth: DEFAULT_MAX_REORG_DEPTH,
            retention_window: DEFAULT_RETENTION_WINDOW,
            coinbase_reward: DEFAULT_COINBASE_REWARD,
        }
    }
}

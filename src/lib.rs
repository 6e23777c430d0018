//! UTXO Ledger Core Library
//!
//! Validation and chain selection for a single-node UTXO ledger: per
//! transaction admissibility, fixpoint processing of interdependent
//! transactions within a block, and a forked block tree with a bounded
//! re-org depth and bounded memory.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod node;
pub mod storage;
pub mod validation;

pub use config::{ChainConfig, ConfigError};
pub use consensus::{Block, BlockBuilder, BlockError, ChainTree};
pub use node::{Node, NodeHandle};

/// Protocol constants - defaults for [`ChainConfig`]
pub mod constants {
    use crate::validation::Amount;

    /// Height of the genesis block
    pub const GENESIS_HEIGHT: u64 = 1;

    /// A block may not attach to a parent this many heights behind the best tip
    pub const DEFAULT_MAX_REORG_DEPTH: u64 = 10;

    /// Heights below the best tip kept in memory
    pub const DEFAULT_RETENTION_WINDOW: u64 = 16;

    /// Coinbase value used when assembling blocks
    pub const DEFAULT_COINBASE_REWARD: Amount = 25;
}

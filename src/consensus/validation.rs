//! Block admission rules
//!
//! Pure checks used by the chain tree before a block's transactions are
//! replayed.

use thiserror::Error;

use crate::consensus::Block;
use crate::crypto::Hash;
use crate::validation::TxError;

/// Reasons a block is not attached to the chain tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Block {0} declares no parent")]
    MissingParent(Hash),
    #[error("Block {0} is already in the tree")]
    DuplicateBlock(Hash),
    #[error("Parent {0} is not a live chain node")]
    OrphanBlock(Hash),
    #[error("Parent height {parent_height} is too far behind best height {best_height}")]
    StaleBlock { parent_height: u64, best_height: u64 },
    #[error("Coinbase must not spend inputs")]
    InvalidCoinbase,
    #[error("{rejected} transaction(s) failed validation, first: {reason}")]
    InvalidBlockTransactions { rejected: usize, reason: TxError },
}

/// Enforce the re-org window: a parent at height `h` is usable only when
/// `h > best_height - max_reorg_depth`.
pub fn check_reorg_depth(
    parent_height: u64,
    best_height: u64,
    max_reorg_depth: u64,
) -> Result<(), BlockError> {
    if best_height >= max_reorg_depth && parent_height <= best_height - max_reorg_depth {
        return Err(BlockError::StaleBlock {
            parent_height,
            best_height,
        });
    }
    Ok(())
}

/// The coinbase issues value out of nothing: it may not claim inputs, and
/// every output it creates must be non-negative.
pub fn validate_coinbase(block: &Block) -> Result<(), BlockError> {
    let coinbase = block.coinbase();
    if !coinbase.is_coinbase() || coinbase.outputs().iter().any(|out| out.value < 0) {
        return Err(BlockError::InvalidCoinbase);
    }
    Ok(())
}

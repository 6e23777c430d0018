//! Pending transaction pool
//!
//! Transactions submitted but not yet included in an accepted block. No
//! validation happens on insert; admissibility is decided when a block
//! carrying the transaction is processed.

use std::collections::HashMap;

use crate::crypto::Hash;
use crate::validation::Transaction;

/// Pool of pending transactions keyed by content hash
#[derive(Debug, Clone, Default)]
pub struct TxPool {
    txs: HashMap<Hash, Transaction>,
}

impl TxPool {
    pub fn new() -> Self {
        Self {
            txs: HashMap::new(),
        }
    }

    /// Insert a transaction. Returns `false` if it was already pending.
    pub fn add(&mut self, tx: Transaction) -> bool {
        self.txs.insert(tx.hash(), tx).is_none()
    }

    /// Remove a transaction by hash
    pub fn remove(&mut self, hash: &Hash) -> Option<Transaction> {
        self.txs.remove(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.txs.contains_key(hash)
    }

    /// Snapshot of every pending transaction, for block assembly
    pub fn transactions(&self) -> Vec<Transaction> {
        self.txs.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

//! Node facade
//!
//! The surface an orchestration layer drives: submit transactions and
//! blocks, read the best tip, and assemble the next block from the pending
//! pool. [`service`] runs a node behind a single-writer task for callers that
//! submit concurrently.

pub mod service;

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ChainConfig;
use crate::consensus::{apply_batch, Block, BlockBuilder, BlockError, ChainTree};
use crate::crypto::{PublicKey, Schnorr, SignatureScheme};
use crate::storage::UtxoSet;
use crate::validation::Transaction;

pub use service::{NodeHandle, ServiceError};

/// A single ledger node owning one chain tree
#[derive(Debug)]
pub struct Node<S = Schnorr> {
    chain: ChainTree<S>,
}

impl Node<Schnorr> {
    /// Start a node from `genesis`
    pub fn new(genesis: Block, config: ChainConfig) -> Self {
        Self::from_chain(ChainTree::new(genesis, config))
    }
}

impl<S: SignatureScheme> Node<S> {
    pub fn from_chain(chain: ChainTree<S>) -> Self {
        Self { chain }
    }

    /// Queue a transaction. Returns `false` if it was already pending.
    pub fn submit_transaction(&mut self, tx: Transaction) -> bool {
        debug!(tx = %tx.hash().short(), "transaction submitted");
        self.chain.add_pending_transaction(tx)
    }

    /// Offer a block to the chain tree
    pub fn submit_block(&mut self, block: Block) -> bool {
        self.chain.submit_block(block)
    }

    /// Like [`Node::submit_block`] but reports why a block was refused
    pub fn try_submit_block(&mut self, block: Block) -> Result<u64, BlockError> {
        self.chain.add_block(block)
    }

    pub fn current_best_block(&self) -> Arc<Block> {
        Arc::clone(self.chain.best_block())
    }

    /// Read-only ledger state at the best tip
    pub fn current_best_snapshot(&self) -> Arc<UtxoSet> {
        self.chain.best_snapshot()
    }

    /// Pending transactions available for the next block
    pub fn current_pending_pool(&self) -> Vec<Transaction> {
        self.chain.pending_pool().transactions()
    }

    pub fn oldest_retained_height(&self) -> u64 {
        self.chain.oldest_retained_height()
    }

    pub fn best_height(&self) -> u64 {
        self.chain.best_height()
    }

    /// Assemble a block on the best tip from the pending pool and submit it.
    ///
    /// Pool transactions that are not admissible against the best snapshot
    /// are left out and stay pending. Returns the block if it was accepted.
    pub fn create_block(&mut self, coinbase_owner: PublicKey) -> Option<Arc<Block>> {
        let parent = self.chain.best_block().hash();
        let candidates = self.chain.pending_pool().transactions();
        let mut utxos = UtxoSet::clone(&self.chain.best_snapshot());

        let outcome = apply_batch(&candidates, &mut utxos, self.chain.scheme());
        let reward = self.chain.config().coinbase_reward();

        let mut builder = BlockBuilder::new(Some(parent), coinbase_owner, reward);
        for tx in outcome.accepted {
            builder.add_transaction(tx);
        }
        let block = builder.build();
        let hash = block.hash();

        let height = self.chain.add_block(block).ok()?;
        info!(
            block = %hash.short(),
            height,
            left_pending = self.chain.pending_pool().len(),
            "assembled block"
        );
        self.chain.node(&hash).map(|node| Arc::clone(node.block()))
    }

    pub fn chain(&self) -> &ChainTree<S> {
        &self.chain
    }
}

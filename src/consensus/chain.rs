//! Chain tree management
//!
//! Accepted blocks form a tree rooted at genesis. Every node owns the UTXO
//! snapshot of its branch, so competing forks validate independently. The
//! best tip is the highest node (first seen wins at equal height). A block
//! may only extend a parent within `max_reorg_depth` of the best height, and
//! nodes more than `retention_window` heights below the best tip are evicted.
//!
//! Nodes live in an arena keyed by block hash; parent and child links are
//! hashes, never references.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::constants::GENESIS_HEIGHT;
use crate::consensus::{apply_batch, check_reorg_depth, validate_coinbase, Block, BlockError};
use crate::crypto::{Hash, Schnorr, SignatureScheme};
use crate::storage::{TxPool, UtxoSet};
use crate::validation::Transaction;

/// One accepted block with the ledger state after it
#[derive(Debug)]
pub struct ChainNode {
    block: Arc<Block>,
    height: u64,
    parent: Option<Hash>,
    utxos: Arc<UtxoSet>,
    children: Vec<Hash>,
}

impl ChainNode {
    pub fn block(&self) -> &Arc<Block> {
        &self.block
    }

    /// Genesis is height 1
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Parent key. May no longer resolve once the parent has been pruned.
    pub fn parent(&self) -> Option<Hash> {
        self.parent
    }

    /// Ledger state after this block's transactions and coinbase
    pub fn utxos(&self) -> &Arc<UtxoSet> {
        &self.utxos
    }

    pub fn children(&self) -> &[Hash] {
        &self.children
    }
}

/// Tree of accepted blocks plus the shared pending pool
#[derive(Debug)]
pub struct ChainTree<S = Schnorr> {
    nodes: HashMap<Hash, ChainNode>,
    best: Hash,
    oldest_height: u64,
    pool: TxPool,
    config: ChainConfig,
    scheme: S,
}

impl ChainTree<Schnorr> {
    /// Create a tree holding only `genesis`, verifying signatures with Schnorr
    pub fn new(genesis: Block, config: ChainConfig) -> Self {
        Self::with_scheme(genesis, config, Schnorr)
    }
}

impl<S: SignatureScheme> ChainTree<S> {
    /// Create a tree holding only `genesis`.
    ///
    /// Genesis is trusted: its snapshot holds exactly its coinbase outputs and
    /// any other transactions it carries are ignored.
    pub fn with_scheme(genesis: Block, config: ChainConfig, scheme: S) -> Self {
        let mut utxos = UtxoSet::new();
        utxos.apply_transaction(genesis.coinbase());

        let hash = genesis.hash();
        let node = ChainNode {
            block: Arc::new(genesis),
            height: GENESIS_HEIGHT,
            parent: None,
            utxos: Arc::new(utxos),
            children: Vec::new(),
        };

        let mut nodes = HashMap::new();
        nodes.insert(hash, node);
        info!(genesis = %hash.short(), "chain initialized");

        Self {
            nodes,
            best: hash,
            oldest_height: GENESIS_HEIGHT,
            pool: TxPool::new(),
            config,
            scheme,
        }
    }

    /// Attach `block` to the tree, returning its height.
    ///
    /// Rejections leave both the tree and the pending pool untouched.
    pub fn add_block(&mut self, block: Block) -> Result<u64, BlockError> {
        let hash = block.hash();
        match self.connect_block(block) {
            Ok(height) => Ok(height),
            Err(err) => {
                warn!(block = %hash.short(), %err, "rejected block");
                Err(err)
            }
        }
    }

    /// Boolean form of [`ChainTree::add_block`]
    pub fn submit_block(&mut self, block: Block) -> bool {
        self.add_block(block).is_ok()
    }

    fn connect_block(&mut self, block: Block) -> Result<u64, BlockError> {
        let hash = block.hash();
        let parent_hash = block.prev_hash().ok_or(BlockError::MissingParent(hash))?;

        if self.nodes.contains_key(&hash) {
            return Err(BlockError::DuplicateBlock(hash));
        }

        let parent = self
            .nodes
            .get(&parent_hash)
            .ok_or(BlockError::OrphanBlock(parent_hash))?;
        check_reorg_depth(parent.height, self.best_height(), self.config.max_reorg_depth())?;
        validate_coinbase(&block)?;

        let height = parent.height + 1;
        let mut utxos = UtxoSet::clone(&parent.utxos);

        let outcome = apply_batch(block.transactions(), &mut utxos, &self.scheme);
        if let Some((_, reason)) = outcome.rejected.first() {
            return Err(BlockError::InvalidBlockTransactions {
                rejected: outcome.rejected.len(),
                reason: reason.clone(),
            });
        }

        utxos.apply_transaction(block.coinbase());

        for tx in block.transactions() {
            self.pool.remove(&tx.hash());
        }

        if let Some(parent) = self.nodes.get_mut(&parent_hash) {
            parent.children.push(hash);
        }
        self.nodes.insert(
            hash,
            ChainNode {
                block: Arc::new(block),
                height,
                parent: Some(parent_hash),
                utxos: Arc::new(utxos),
                children: Vec::new(),
            },
        );
        debug!(
            block = %hash.short(),
            height,
            txs = outcome.accepted.len(),
            passes = outcome.passes,
            "connected block"
        );

        if height > self.best_height() {
            self.best = hash;
            info!(block = %hash.short(), height, "new best tip");
            self.prune();
        }

        Ok(height)
    }

    /// Evict every node more than `retention_window` heights below the best
    fn prune(&mut self) {
        let best_height = self.best_height();
        let window = self.config.retention_window();
        if best_height - self.oldest_height <= window {
            return;
        }

        let cutoff = best_height - window;
        let before = self.nodes.len();
        self.nodes.retain(|_, node| node.height >= cutoff);
        self.oldest_height = cutoff;

        info!(
            evicted = before - self.nodes.len(),
            oldest_height = cutoff,
            "pruned chain tree"
        );
    }

    fn best_node(&self) -> &ChainNode {
        // the best node is never below the pruning cutoff
        &self.nodes[&self.best]
    }

    /// Block at the best tip
    pub fn best_block(&self) -> &Arc<Block> {
        self.best_node().block()
    }

    pub fn best_height(&self) -> u64 {
        self.best_node().height
    }

    /// Ledger state at the best tip, for assembling the next block
    pub fn best_snapshot(&self) -> Arc<UtxoSet> {
        Arc::clone(self.best_node().utxos())
    }

    /// Height of the lowest node still held in memory
    pub fn oldest_retained_height(&self) -> u64 {
        self.oldest_height
    }

    pub fn pending_pool(&self) -> &TxPool {
        &self.pool
    }

    /// Queue a transaction for a future block. Not validated here.
    pub fn add_pending_transaction(&mut self, tx: Transaction) -> bool {
        self.pool.add(tx)
    }

    pub fn node(&self, hash: &Hash) -> Option<&ChainNode> {
        self.nodes.get(hash)
    }

    pub fn contains_block(&self, hash: &Hash) -> bool {
        self.nodes.contains_key(hash)
    }

    /// Number of retained nodes, never zero
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }
}

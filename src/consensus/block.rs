//! Block structure
//!
//! A block is one coinbase plus an unordered batch of ordinary transactions,
//! linked to its parent by hash. The content hash is fixed at finalization.

use serde::{Deserialize, Serialize};

use crate::crypto::{hash_bytes, Hash, PublicKey};
use crate::validation::{Amount, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BlockBody {
    /// Hash of the previous block, `None` only for genesis
    prev_hash: Option<Hash>,
    /// Reward issuance
    coinbase: Transaction,
    /// Ordinary transactions, in no significant order
    transactions: Vec<Transaction>,
}

impl BlockBody {
    /// Serialize the body for hashing
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + 32 * (3 + self.transactions.len()));
        match &self.prev_hash {
            Some(prev) => {
                bytes.push(1);
                bytes.extend_from_slice(&prev.0);
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(&self.coinbase.hash().0);
        bytes.extend_from_slice(&(self.transactions.len() as u32).to_le_bytes());
        for tx in &self.transactions {
            bytes.extend_from_slice(&tx.hash().0);
        }
        bytes
    }
}

/// A finalized block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BlockBody", into = "BlockBody")]
pub struct Block {
    body: BlockBody,
    hash: Hash,
}

impl From<BlockBody> for Block {
    fn from(body: BlockBody) -> Self {
        let hash = hash_bytes(&body.to_bytes());
        Self { body, hash }
    }
}

impl From<Block> for BlockBody {
    fn from(block: Block) -> Self {
        block.body
    }
}

impl Block {
    /// Genesis block paying `reward` to `owner`
    pub fn genesis(owner: PublicKey, reward: Amount) -> Self {
        BlockBuilder::new(None, owner, reward).build()
    }

    /// Get the block hash
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Hash of the parent block, `None` for genesis
    pub fn prev_hash(&self) -> Option<Hash> {
        self.body.prev_hash
    }

    pub fn coinbase(&self) -> &Transaction {
        &self.body.coinbase
    }

    /// Ordinary (non-coinbase) transactions
    pub fn transactions(&self) -> &[Transaction] {
        &self.body.transactions
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.body.prev_hash.is_none()
    }
}

/// Collects transactions for a block on top of a given parent
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    body: BlockBody,
}

impl BlockBuilder {
    /// Start a block whose coinbase pays `reward` to `owner`
    pub fn new(prev_hash: Option<Hash>, owner: PublicKey, reward: Amount) -> Self {
        let anchor = prev_hash.unwrap_or_else(Hash::zero);
        Self::with_coinbase(prev_hash, Transaction::coinbase(reward, owner, anchor))
    }

    /// Start a block with an explicit coinbase transaction
    pub fn with_coinbase(prev_hash: Option<Hash>, coinbase: Transaction) -> Self {
        Self {
            body: BlockBody {
                prev_hash,
                coinbase,
                transactions: Vec::new(),
            },
        }
    }

    pub fn add_transaction(&mut self, tx: Transaction) -> &mut Self {
        self.body.transactions.push(tx);
        self
    }

    pub fn transaction(mut self, tx: Transaction) -> Self {
        self.body.transactions.push(tx);
        self
    }

    /// Finalize and compute the block hash
    pub fn build(self) -> Block {
        self.body.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::validation::TransactionBuilder;

    fn key() -> PublicKey {
        PrivateKey::generate().public_key()
    }

    #[test]
    fn test_genesis_block_detection() {
        let genesis = Block::genesis(key(), 25);
        assert!(genesis.is_genesis());
        assert!(genesis.transactions().is_empty());
        assert!(genesis.coinbase().is_coinbase());

        let child = BlockBuilder::new(Some(genesis.hash()), key(), 25).build();
        assert!(!child.is_genesis());
        assert_eq!(child.prev_hash(), Some(genesis.hash()));
    }

    #[test]
    fn test_hash_depends_on_transactions() {
        let miner = key();
        let parent = hash_bytes(b"parent");
        let empty = BlockBuilder::new(Some(parent), miner.clone(), 25).build();
        let tx = TransactionBuilder::new().output(0, key()).build();
        let full = BlockBuilder::new(Some(parent), miner, 25).transaction(tx).build();

        assert_ne!(empty.hash(), full.hash());
    }

    #[test]
    fn test_sequential_coinbases_differ() {
        let miner = key();
        let genesis = Block::genesis(miner.clone(), 25);
        let next = BlockBuilder::new(Some(genesis.hash()), miner, 25).build();

        assert_ne!(genesis.coinbase().hash(), next.coinbase().hash());
    }

    #[test]
    fn test_block_json_keeps_hash() {
        let block = BlockBuilder::new(Some(hash_bytes(b"p")), key(), 25)
            .transaction(TransactionBuilder::new().output(0, key()).build())
            .build();

        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hash(), block.hash());
    }
}

//! Single-writer node service
//!
//! One tokio task owns the [`Node`]; every caller talks to it through a
//! cloneable [`NodeHandle`]. Commands are applied strictly one at a time, so
//! concurrent submitters never interleave inside `add_block`.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::Node;
use crate::consensus::Block;
use crate::crypto::{PublicKey, SignatureScheme};
use crate::storage::UtxoSet;
use crate::validation::Transaction;

/// Queued commands before submitters wait
const COMMAND_BUFFER: usize = 256;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Node service has stopped")]
    Closed,
}

enum Command {
    SubmitTransaction(Transaction, oneshot::Sender<bool>),
    SubmitBlock(Block, oneshot::Sender<bool>),
    CreateBlock(PublicKey, oneshot::Sender<Option<Arc<Block>>>),
    BestBlock(oneshot::Sender<Arc<Block>>),
    BestSnapshot(oneshot::Sender<Arc<UtxoSet>>),
    PendingPool(oneshot::Sender<Vec<Transaction>>),
    OldestRetainedHeight(oneshot::Sender<u64>),
}

/// Cloneable handle to a running node service
#[derive(Debug, Clone)]
pub struct NodeHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::SubmitTransaction(..) => "SubmitTransaction",
            Command::SubmitBlock(..) => "SubmitBlock",
            Command::CreateBlock(..) => "CreateBlock",
            Command::BestBlock(_) => "BestBlock",
            Command::BestSnapshot(_) => "BestSnapshot",
            Command::PendingPool(_) => "PendingPool",
            Command::OldestRetainedHeight(_) => "OldestRetainedHeight",
        };
        f.write_str(name)
    }
}

/// Move `node` onto its own task.
///
/// The task stops once every handle is dropped and hands the node back
/// through the returned join handle.
pub fn spawn<S>(node: Node<S>) -> (NodeHandle, JoinHandle<Node<S>>)
where
    S: SignatureScheme + Send + 'static,
{
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(node, rx));
    (NodeHandle { commands: tx }, task)
}

async fn run<S: SignatureScheme>(mut node: Node<S>, mut rx: mpsc::Receiver<Command>) -> Node<S> {
    while let Some(command) = rx.recv().await {
        debug!(?command, "node command");
        // a dropped reply receiver only means the caller stopped waiting
        match command {
            Command::SubmitTransaction(tx, reply) => {
                let _ = reply.send(node.submit_transaction(tx));
            }
            Command::SubmitBlock(block, reply) => {
                let _ = reply.send(node.submit_block(block));
            }
            Command::CreateBlock(owner, reply) => {
                let _ = reply.send(node.create_block(owner));
            }
            Command::BestBlock(reply) => {
                let _ = reply.send(node.current_best_block());
            }
            Command::BestSnapshot(reply) => {
                let _ = reply.send(node.current_best_snapshot());
            }
            Command::PendingPool(reply) => {
                let _ = reply.send(node.current_pending_pool());
            }
            Command::OldestRetainedHeight(reply) => {
                let _ = reply.send(node.oldest_retained_height());
            }
        }
    }
    node
}

impl NodeHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn submit_transaction(&self, tx: Transaction) -> Result<bool, ServiceError> {
        self.request(|reply| Command::SubmitTransaction(tx, reply)).await
    }

    pub async fn submit_block(&self, block: Block) -> Result<bool, ServiceError> {
        self.request(|reply| Command::SubmitBlock(block, reply)).await
    }

    /// Assemble and submit a block from the pending pool
    pub async fn create_block(&self, owner: PublicKey) -> Result<Option<Arc<Block>>, ServiceError> {
        self.request(|reply| Command::CreateBlock(owner, reply)).await
    }

    pub async fn current_best_block(&self) -> Result<Arc<Block>, ServiceError> {
        self.request(Command::BestBlock).await
    }

    pub async fn current_best_snapshot(&self) -> Result<Arc<UtxoSet>, ServiceError> {
        self.request(Command::BestSnapshot).await
    }

    pub async fn current_pending_pool(&self) -> Result<Vec<Transaction>, ServiceError> {
        self.request(Command::PendingPool).await
    }

    pub async fn oldest_retained_height(&self) -> Result<u64, ServiceError> {
        self.request(Command::OldestRetainedHeight).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::consensus::BlockBuilder;
    use crate::crypto::PrivateKey;
    use crate::validation::TransactionBuilder;

    #[tokio::test]
    async fn test_handle_round_trip() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();
        let genesis = Block::genesis(alice.public_key(), 25);
        let funding = genesis.coinbase().outpoint(0);
        let (handle, task) = spawn(Node::new(genesis.clone(), ChainConfig::default()));

        let pay = TransactionBuilder::new()
            .input(funding)
            .output(25, bob.public_key())
            .sign_all(&alice)
            .build();
        assert!(handle.submit_transaction(pay.clone()).await.unwrap());
        assert_eq!(handle.current_pending_pool().await.unwrap(), vec![pay]);

        let block = handle.create_block(bob.public_key()).await.unwrap().unwrap();
        assert_eq!(handle.current_best_block().await.unwrap().hash(), block.hash());
        assert!(handle.current_pending_pool().await.unwrap().is_empty());

        let snapshot = handle.current_best_snapshot().await.unwrap();
        assert_eq!(snapshot.get_balance(&bob.public_key()), 50);
        assert_eq!(handle.oldest_retained_height().await.unwrap(), 1);

        drop(handle);
        let node = task.await.unwrap();
        assert_eq!(node.best_height(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_submitters_serialize() {
        let miner = PrivateKey::generate();
        let genesis = Block::genesis(miner.public_key(), 25);
        let (handle, task) = spawn(Node::new(genesis.clone(), ChainConfig::default()));

        // eight competing children of genesis; exactly one becomes best
        let mut joins = Vec::new();
        for _ in 0..8 {
            let handle = handle.clone();
            let block = BlockBuilder::new(
                Some(genesis.hash()),
                PrivateKey::generate().public_key(),
                25,
            )
            .build();
            joins.push(tokio::spawn(async move { handle.submit_block(block).await }));
        }
        for join in joins {
            assert!(join.await.unwrap().unwrap());
        }

        drop(handle);
        let node = task.await.unwrap();
        assert_eq!(node.best_height(), 2);
        assert_eq!(node.chain().node_count(), 9);
    }

    #[tokio::test]
    async fn test_closed_service_reports_error() {
        let miner = PrivateKey::generate();
        let (handle, task) = spawn(Node::new(
            Block::genesis(miner.public_key(), 25),
            ChainConfig::default(),
        ));
        task.abort();
        let _ = task.await;

        assert!(matches!(
            handle.oldest_retained_height().await,
            Err(ServiceError::Closed)
        ));
    }
}

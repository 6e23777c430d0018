//! Ledger node
//!
//! Runs a local node behind the single-writer service and drives a short
//! simulation: transfers are submitted to the pending pool and blocks are
//! assembled on the best tip. No networking, no mining.
//!
//! Usage: `ledger-node [config.json] [rounds]`

use tracing_subscriber::EnvFilter;
use utxo_ledger::crypto::PrivateKey;
use utxo_ledger::node::{service, Node};
use utxo_ledger::validation::TransactionBuilder;
use utxo_ledger::{Block, ChainConfig};

/// Blocks assembled when no round count is given
const DEFAULT_ROUNDS: u64 = 24;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ChainConfig::from_json_file(&path)?,
        None => ChainConfig::default(),
    };
    let rounds = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_ROUNDS,
    };

    println!("Chain Configuration:");
    println!("  Max re-org depth:  {}", config.max_reorg_depth());
    println!("  Retention window:  {}", config.retention_window());
    println!("  Coinbase reward:   {}", config.coinbase_reward());
    println!();

    let alice = PrivateKey::generate();
    let bob = PrivateKey::generate();

    let genesis = Block::genesis(alice.public_key(), config.coinbase_reward());
    println!("Genesis: {}", genesis.hash());

    let (handle, task) = service::spawn(Node::new(genesis, config));

    // alternate payer each round: whoever holds coins sends half to the other
    for round in 0..rounds {
        let (payer, payee) = if round % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        let snapshot = handle.current_best_snapshot().await?;

        if let Some((outpoint, output)) = snapshot.get_by_owner(&payer.public_key()).first() {
            let half = output.value / 2;
            let tx = TransactionBuilder::new()
                .input(*outpoint)
                .output(half, payee.public_key())
                .output(output.value - half, payer.public_key())
                .sign_all(payer)
                .build();
            handle.submit_transaction(tx).await?;
        }

        let miner = if round % 3 == 0 { &bob } else { &alice };
        match handle.create_block(miner.public_key()).await? {
            Some(block) => println!(
                "Round {:>3}: block {} with {} transaction(s)",
                round,
                block.hash().short(),
                block.transactions().len()
            ),
            None => println!("Round {:>3}: block rejected", round),
        }
    }

    let best = handle.current_best_block().await?;
    let snapshot = handle.current_best_snapshot().await?;
    let oldest = handle.oldest_retained_height().await?;
    drop(handle);
    let node = task.await?;

    println!();
    println!("Chain State:");
    println!("  Best height:     {}", node.best_height());
    println!("  Best hash:       {}", best.hash());
    println!("  Oldest retained: {}", oldest);
    println!("  Nodes in memory: {}", node.chain().node_count());
    println!("  UTXO count:      {}", snapshot.len());
    println!("  Alice balance:   {}", snapshot.get_balance(&alice.public_key()));
    println!("  Bob balance:     {}", snapshot.get_balance(&bob.public_key()));

    Ok(())
}

//! Storage module - UTXO snapshots and the pending transaction pool

mod utxo;
mod mempool;

pub use utxo::*;
pub use mempool::*;

//! Consensus module - blocks, batch processing and the chain tree

mod block;
mod validation;
mod processor;
mod chain;

pub use block::*;
pub use validation::*;
pub use processor::*;
pub use chain::*;

//! Validation module - transactions and single-transaction admissibility

mod transaction;
mod validator;

pub use transaction::*;
pub use validator::*;

//! Cryptography module - BLAKE3 hashing, Schnorr signatures

mod hash;
mod schnorr;

pub use hash::*;
pub use schnorr::*;

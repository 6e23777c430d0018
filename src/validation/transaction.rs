//! Transaction structure
//!
//! UTXO-based transactions. Every input carries the signature bytes for its
//! own signable payload; the content hash covers inputs (signatures
//! included), outputs and the coinbase anchor, and is computed once when the
//! transaction is finalized.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{hash_bytes, Hash, PrivateKey, PublicKey};

/// Value carried by an output. Signed so that a negative declared value can
/// be represented and rejected.
pub type Amount = i64;

/// Identifier of one spendable output: (producing tx hash, output index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction containing the output
    pub tx_hash: Hash,
    /// Index of the output in that transaction
    pub index: u32,
}

impl OutPoint {
    pub fn new(tx_hash: Hash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash.short(), self.index)
    }
}

/// A transaction input referencing a previous output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// The output being claimed
    pub prev_out: OutPoint,
    /// Signature over the input's signable payload
    pub signature: Vec<u8>,
}

/// A transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units
    pub value: Amount,
    /// Key that must sign to spend this output
    pub owner: PublicKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TransactionBody {
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    /// Coinbase only: hash of the parent block. Zero otherwise.
    anchor: Hash,
}

impl TransactionBody {
    fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(index)?;
        let mut bytes = Vec::with_capacity(36 + self.outputs.len() * 40);

        bytes.extend_from_slice(&input.prev_out.tx_hash.0);
        bytes.extend_from_slice(&input.prev_out.index.to_le_bytes());

        for output in &self.outputs {
            bytes.extend_from_slice(&output.value.to_le_bytes());
            bytes.extend_from_slice(&output.owner.0);
        }

        Some(bytes)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            bytes.extend_from_slice(&input.prev_out.tx_hash.0);
            bytes.extend_from_slice(&input.prev_out.index.to_le_bytes());
            bytes.extend_from_slice(&(input.signature.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&input.signature);
        }

        bytes.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            bytes.extend_from_slice(&output.value.to_le_bytes());
            bytes.extend_from_slice(&output.owner.0);
        }

        bytes.extend_from_slice(&self.anchor.0);
        bytes
    }
}

/// A finalized transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TransactionBody", into = "TransactionBody")]
pub struct Transaction {
    body: TransactionBody,
    hash: Hash,
}

impl From<TransactionBody> for Transaction {
    fn from(body: TransactionBody) -> Self {
        let hash = hash_bytes(&body.to_bytes());
        Self { body, hash }
    }
}

impl From<Transaction> for TransactionBody {
    fn from(tx: Transaction) -> Self {
        tx.body
    }
}

impl Transaction {
    /// Finalize a transaction from already-signed inputs and outputs
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        TransactionBody {
            inputs,
            outputs,
            anchor: Hash::zero(),
        }
        .into()
    }

    /// Create a coinbase transaction paying `reward` to `owner`.
    ///
    /// `anchor` is the parent block hash (zero for genesis) so that equal
    /// rewards to the same key at different heights hash apart.
    pub fn coinbase(reward: Amount, owner: PublicKey, anchor: Hash) -> Self {
        TransactionBody {
            inputs: Vec::new(),
            outputs: vec![TxOutput { value: reward, owner }],
            anchor,
        }
        .into()
    }

    /// Check if this is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.body.inputs.is_empty()
    }

    /// Content hash, fixed at finalization
    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.body.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.body.outputs
    }

    /// Identifier of this transaction's `index`-th output
    pub fn outpoint(&self, index: u32) -> OutPoint {
        OutPoint::new(self.hash, index)
    }

    /// Bytes the owner of input `index` signs, or `None` if out of range
    pub fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        self.body.signing_payload(index)
    }

    /// Sum of declared output values, `None` on overflow
    pub fn total_output_value(&self) -> Option<Amount> {
        self.body
            .outputs
            .iter()
            .try_fold(0 as Amount, |acc, o| acc.checked_add(o.value))
    }
}

/// Assembles and signs a transaction before it is finalized.
///
/// Signatures must be added after every output is in place, since each
/// input's payload covers all outputs.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    body: TransactionBody,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `prev_out`, unsigned for now
    pub fn input(mut self, prev_out: OutPoint) -> Self {
        self.body.inputs.push(TxInput {
            prev_out,
            signature: Vec::new(),
        });
        self
    }

    /// Pay `value` to `owner`
    pub fn output(mut self, value: Amount, owner: PublicKey) -> Self {
        self.body.outputs.push(TxOutput { value, owner });
        self
    }

    /// Signable payload of input `index` as the transaction currently stands
    pub fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        self.body.signing_payload(index)
    }

    /// Attach raw signature bytes to input `index`. Ignored when out of range.
    pub fn signature(mut self, index: usize, signature: Vec<u8>) -> Self {
        if let Some(input) = self.body.inputs.get_mut(index) {
            input.signature = signature;
        }
        self
    }

    /// Sign input `index` with `key`
    pub fn sign(self, index: usize, key: &PrivateKey) -> Self {
        match self.signing_payload(index) {
            Some(payload) => {
                let signature = key.sign(&payload).to_vec();
                self.signature(index, signature)
            }
            None => self,
        }
    }

    /// Sign every input with the same key
    pub fn sign_all(self, key: &PrivateKey) -> Self {
        (0..self.body.inputs.len()).fold(self, |builder, index| builder.sign(index, key))
    }

    /// Finalize and compute the content hash
    pub fn build(self) -> Transaction {
        self.body.into()
    }
}

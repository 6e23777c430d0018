//! UTXO set implementation
//!
//! In-memory ledger snapshot of unspent transaction outputs. Each chain node
//! owns one; branching a new tip is a deep `clone()`.

use std::collections::HashMap;

use crate::crypto::PublicKey;
use crate::validation::{Amount, OutPoint, Transaction, TxOutput};

/// Set of all unspent transaction outputs on one branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSet {
    utxos: HashMap<OutPoint, TxOutput>,
}

impl UtxoSet {
    /// Create a new empty UTXO set
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    /// Check if a UTXO exists
    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    /// Get a UTXO if it exists
    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.utxos.get(outpoint)
    }

    /// Add a UTXO
    pub fn add(&mut self, outpoint: OutPoint, output: TxOutput) {
        self.utxos.insert(outpoint, output);
    }

    /// Remove a UTXO (when spent)
    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<TxOutput> {
        self.utxos.remove(outpoint)
    }

    /// Apply a transaction to the UTXO set
    ///
    /// Removes claimed outputs and adds new ones under `(tx.hash(), index)`.
    /// Does not validate; callers check admissibility first.
    pub fn apply_transaction(&mut self, tx: &Transaction) {
        for input in tx.inputs() {
            self.remove(&input.prev_out);
        }

        for (index, output) in tx.outputs().iter().enumerate() {
            self.add(tx.outpoint(index as u32), output.clone());
        }
    }

    /// All outputs spendable by `owner`
    pub fn get_by_owner(&self, owner: &PublicKey) -> Vec<(OutPoint, &TxOutput)> {
        self.utxos
            .iter()
            .filter(|(_, output)| output.owner == *owner)
            .map(|(outpoint, output)| (*outpoint, output))
            .collect()
    }

    /// Total value spendable by `owner`
    pub fn get_balance(&self, owner: &PublicKey) -> Amount {
        self.get_by_owner(owner)
            .iter()
            .fold(0, |acc: Amount, (_, output)| acc.saturating_add(output.value))
    }

    /// Get total number of UTXOs
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{hash_bytes, Hash, PrivateKey};
    use crate::validation::TransactionBuilder;

    fn owner() -> PublicKey {
        PrivateKey::generate().public_key()
    }

    #[test]
    fn test_utxo_add_and_get() {
        let mut set = UtxoSet::new();
        let outpoint = OutPoint::new(hash_bytes(b"tx1"), 0);

        set.add(outpoint, TxOutput { value: 100, owner: owner() });

        assert!(set.contains(&outpoint));
        assert!(!set.contains(&OutPoint::new(hash_bytes(b"tx1"), 1)));
        assert_eq!(set.get(&outpoint).unwrap().value, 100);
    }

    #[test]
    fn test_utxo_remove() {
        let mut set = UtxoSet::new();
        let outpoint = OutPoint::new(hash_bytes(b"tx1"), 0);
        set.add(outpoint, TxOutput { value: 100, owner: owner() });

        assert!(set.remove(&outpoint).is_some());
        assert!(!set.contains(&outpoint));
        assert!(set.remove(&outpoint).is_none());
    }

    #[test]
    fn test_get_balance() {
        let mut set = UtxoSet::new();
        let alice = owner();

        let output = |value, owner| TxOutput { value, owner };
        set.add(OutPoint::new(hash_bytes(b"tx1"), 0), output(100, alice.clone()));
        set.add(OutPoint::new(hash_bytes(b"tx2"), 0), output(200, alice.clone()));
        set.add(OutPoint::new(hash_bytes(b"tx3"), 0), output(50, owner()));

        assert_eq!(set.get_balance(&alice), 300);
        assert_eq!(set.get_by_owner(&alice).len(), 2);
    }

    #[test]
    fn test_apply_coinbase() {
        let mut set = UtxoSet::new();
        let miner = owner();

        let coinbase = Transaction::coinbase(25, miner.clone(), Hash::zero());
        set.apply_transaction(&coinbase);

        assert!(set.contains(&coinbase.outpoint(0)));
        assert_eq!(set.get_balance(&miner), 25);
    }

    #[test]
    fn test_apply_spend_moves_value() {
        let mut set = UtxoSet::new();
        let alice = owner();
        let bob = owner();
        let coinbase = Transaction::coinbase(25, alice.clone(), Hash::zero());
        set.apply_transaction(&coinbase);

        let spend = TransactionBuilder::new()
            .input(coinbase.outpoint(0))
            .output(20, bob.clone())
            .output(5, alice.clone())
            .build();
        set.apply_transaction(&spend);

        assert!(!set.contains(&coinbase.outpoint(0)));
        assert_eq!(set.get(&spend.outpoint(0)).unwrap().owner, bob);
        assert_eq!(set.get_balance(&alice), 5);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut parent = UtxoSet::new();
        let outpoint = OutPoint::new(hash_bytes(b"tx"), 0);
        parent.add(outpoint, TxOutput { value: 1, owner: owner() });

        let mut branch = parent.clone();
        branch.remove(&outpoint);

        assert!(parent.contains(&outpoint));
        assert!(branch.is_empty());
    }
}

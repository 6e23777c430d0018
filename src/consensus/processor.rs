//! Fixpoint processing of a transaction batch
//!
//! Candidates may spend each other's outputs in any order, so a single pass
//! is not enough. Passes repeat until one accepts nothing new.

use std::collections::HashSet;
use tracing::debug;

use crate::crypto::{Hash, SignatureScheme};
use crate::storage::UtxoSet;
use crate::validation::{check_transaction, Transaction, TxError};

/// Result of [`apply_batch`]
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Accepted transactions, in acceptance order
    pub accepted: Vec<Transaction>,
    /// Rejected candidates in input order, with the last failure observed
    pub rejected: Vec<(Hash, TxError)>,
    /// Number of passes run
    pub passes: usize,
}

impl BatchOutcome {
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Accept the maximal mutually-consistent subset of `candidates`.
///
/// Each accepted transaction is applied to `utxos` immediately, so later
/// candidates see its outputs and cannot reuse its inputs. At most
/// `candidates.len() + 1` passes run.
pub fn apply_batch<S>(candidates: &[Transaction], utxos: &mut UtxoSet, scheme: &S) -> BatchOutcome
where
    S: SignatureScheme + ?Sized,
{
    let mut outcome = BatchOutcome::default();
    let mut accepted_hashes = HashSet::with_capacity(candidates.len());
    let mut reasons: Vec<Option<TxError>> = vec![None; candidates.len()];
    let mut accepted = vec![false; candidates.len()];
    let mut pending: Vec<usize> = (0..candidates.len()).collect();

    loop {
        outcome.passes += 1;
        let mut progress = false;
        let mut still_pending = Vec::with_capacity(pending.len());

        for index in pending {
            let tx = &candidates[index];

            if accepted_hashes.contains(&tx.hash()) {
                reasons[index] = Some(TxError::DuplicateTransaction(tx.hash()));
                continue;
            }

            match check_transaction(tx, utxos, scheme) {
                Ok(fee) => {
                    debug!(
                        tx = %tx.hash().short(),
                        fee,
                        pass = outcome.passes,
                        "accepted transaction"
                    );
                    utxos.apply_transaction(tx);
                    accepted_hashes.insert(tx.hash());
                    accepted[index] = true;
                    outcome.accepted.push(tx.clone());
                    progress = true;
                }
                Err(err) => {
                    reasons[index] = Some(err);
                    still_pending.push(index);
                }
            }
        }

        pending = still_pending;
        if !progress || pending.is_empty() {
            break;
        }
    }

    for (index, reason) in reasons.into_iter().enumerate() {
        if accepted[index] {
            continue;
        }
        if let Some(reason) = reason {
            let hash = candidates[index].hash();
            debug!(tx = %hash.short(), %reason, "rejected transaction");
            outcome.rejected.push((hash, reason));
        }
    }

    outcome
}

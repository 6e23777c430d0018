//! Single-transaction validation against a ledger snapshot
//!
//! Pure functions: nothing here mutates the snapshot.

use std::collections::HashSet;
use thiserror::Error;

use crate::crypto::{Hash, SignatureScheme};
use crate::storage::UtxoSet;
use super::{Amount, OutPoint, Transaction};

/// Reasons a transaction is not admissible
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("Input {input} claims {outpoint}, which is not unspent")]
    MissingInput { input: usize, outpoint: OutPoint },
    #[error("Signature on input {input} does not match the owner of {outpoint}")]
    BadSignature { input: usize, outpoint: OutPoint },
    #[error("Output {0} is claimed more than once")]
    DoubleClaim(OutPoint),
    #[error("Output {output} has negative value {value}")]
    NegativeOutput { output: usize, value: Amount },
    #[error("Inputs total {inputs} but outputs total {outputs}")]
    ValueImbalance { inputs: Amount, outputs: Amount },
    #[error("Value overflow while summing amounts")]
    ValueOverflow,
    #[error("Transaction {0} already accepted in this batch")]
    DuplicateTransaction(Hash),
}

/// Validate `tx` against `utxos`, returning the fee on success.
///
/// Fails on the first violation. Per input: the claimed output must be
/// unspent in `utxos` and not already claimed by an earlier input, and the
/// signature must verify against the claimed output's owner. Then no
/// declared output value may be negative and inputs must cover outputs.
pub fn check_transaction<S>(
    tx: &Transaction,
    utxos: &UtxoSet,
    scheme: &S,
) -> Result<Amount, TxError>
where
    S: SignatureScheme + ?Sized,
{
    let mut claimed = HashSet::with_capacity(tx.inputs().len());
    let mut input_sum: Amount = 0;

    for (index, input) in tx.inputs().iter().enumerate() {
        let outpoint = input.prev_out;
        let prev = utxos.get(&outpoint).ok_or(TxError::MissingInput {
            input: index,
            outpoint,
        })?;

        if !claimed.insert(outpoint) {
            return Err(TxError::DoubleClaim(outpoint));
        }

        let payload = tx.signing_payload(index).unwrap_or_default();
        if !scheme.verify(&prev.owner, &payload, &input.signature) {
            return Err(TxError::BadSignature { input: index, outpoint });
        }

        input_sum = input_sum
            .checked_add(prev.value)
            .ok_or(TxError::ValueOverflow)?;
    }

    let mut output_sum: Amount = 0;
    for (index, output) in tx.outputs().iter().enumerate() {
        if output.value < 0 {
            return Err(TxError::NegativeOutput {
                output: index,
                value: output.value,
            });
        }
        output_sum = output_sum
            .checked_add(output.value)
            .ok_or(TxError::ValueOverflow)?;
    }

    if input_sum < output_sum {
        return Err(TxError::ValueImbalance {
            inputs: input_sum,
            outputs: output_sum,
        });
    }

    Ok(input_sum - output_sum)
}

/// Boolean form of [`check_transaction`]
pub fn is_valid<S>(tx: &Transaction, utxos: &UtxoSet, scheme: &S) -> bool
where
    S: SignatureScheme + ?Sized,
{
    check_transaction(tx, utxos, scheme).is_ok()
}

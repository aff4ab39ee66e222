//! Raw-transaction reconstruction.
//!
//! The execution node replays transactions from their canonical broadcast
//! encoding, so each decoded record plus its detached signature must encode
//! back to the exact bytes the original sender produced. This is the one
//! place where numeric semantics have to match bit for bit: the encoded
//! bytes must deserialize to the same fields and recover the same signer.

use crate::{DecodedTransaction, SignatureParts, TransactionError};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Parity, PrimitiveSignature, Signature};

/// EIP-155 recovery value for a legacy transaction: folds a non-zero chain
/// id into `v` so the signature cannot be replayed on another chain.
pub fn eip155_v(chain_id: u64, v: u64) -> u64 {
    if chain_id != 0 {
        chain_id * 2 + 35 + v
    } else {
        27 + v
    }
}

fn legacy_parity(chain_id: u64, v: u64) -> Parity {
    if chain_id != 0 {
        Parity::Eip155(eip155_v(chain_id, v))
    } else {
        Parity::NonEip155(v == 1)
    }
}

/// Encodes a decoded transaction and its signature into the canonical raw
/// transaction bytes: plain RLP for legacy, a type-prefixed envelope for
/// EIP-1559.
pub fn to_raw_transaction(tx: &DecodedTransaction, sig: &SignatureParts) -> Result<Vec<u8>, TransactionError> {
    let envelope = match tx {
        DecodedTransaction::Legacy(tx) => {
            let signature = Signature::from_rs_and_parity(sig.r, sig.s, legacy_parity(tx.chain_id, sig.v))
                .map_err(|e| TransactionError::Signature(e.to_string()))?;
            let inner = TxLegacy {
                chain_id: (tx.chain_id != 0).then_some(tx.chain_id),
                nonce: tx.nonce,
                gas_price: tx.gas_price,
                gas_limit: tx.gas,
                to: tx.to,
                value: tx.value,
                input: tx.input.clone(),
            };
            TxEnvelope::Legacy(inner.into_signed(PrimitiveSignature::new(
                signature.r(),
                signature.s(),
                signature.v().y_parity(),
            )))
        }
        DecodedTransaction::Eip1559(tx) => {
            let signature = Signature::from_rs_and_parity(sig.r, sig.s, Parity::Parity(sig.v == 1))
                .map_err(|e| TransactionError::Signature(e.to_string()))?;
            let inner = TxEip1559 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_limit: tx.gas,
                max_fee_per_gas: tx.max_fee_per_gas,
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                to: tx.to,
                value: tx.value,
                access_list: tx.access_list.clone(),
                input: tx.input.clone(),
            };
            TxEnvelope::Eip1559(inner.into_signed(PrimitiveSignature::new(
                signature.r(),
                signature.s(),
                signature.v().y_parity(),
            )))
        }
    };
    Ok(envelope.encoded_2718())
}

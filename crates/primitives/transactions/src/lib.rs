//! Transaction model for replayed blocks.
//!
//! Snapshot files carry transactions as loosely-typed records: a content map
//! under a single variant key (`Legacy` or `Eip1559`) plus a detached
//! `(r, s, v)` signature. This crate parses those records into an explicit
//! sum type and reconstructs the canonical raw-transaction encoding the
//! execution node expects, applying EIP-155 to legacy recovery values.

mod from_value;
mod reconstruct;
mod system;

pub use reconstruct::{eip155_v, to_raw_transaction};
pub use system::{adapt_system_tx, SYSTEM_TX_GAS_LIMIT, SYSTEM_TX_SENDER};

use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Bytes, TxKind, U256};

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Transaction wrapper must contain exactly one variant key")]
    MalformedWrapper,
    #[error("Unsupported transaction variant: {0}")]
    UnsupportedVariant(String),
    #[error("Invalid transaction field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error(transparent)]
    Convert(#[from] rp_convert::ConvertError),
    #[error("Cannot build signature: {0}")]
    Signature(String),
}

impl TransactionError {
    fn invalid_field(field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidField { field, reason: reason.to_string() }
    }
}

/// A legacy (pre-EIP-2718) transaction, priced by a single gas price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas: u64,
    pub to: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub gas_price: u128,
}

/// An EIP-1559 transaction with separate base/priority fee caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas: u64,
    pub to: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub access_list: AccessList,
}

/// A transaction decoded from a snapshot record.
///
/// Exactly two variants exist in the snapshot format; anything else is a
/// format error, never a best-effort guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedTransaction {
    Legacy(LegacyTransaction),
    Eip1559(Eip1559Transaction),
}

impl DecodedTransaction {
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.nonce,
            Self::Eip1559(tx) => tx.nonce,
        }
    }
}

/// The detached `(r, s, v)` signature carried next to a transaction record.
///
/// `v` is the raw recovery id (`0` or `1`), before any EIP-155 adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParts {
    pub r: U256,
    pub s: U256,
    pub v: u64,
}

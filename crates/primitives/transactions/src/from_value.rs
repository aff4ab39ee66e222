//! Parsing of normalized transaction records.

use crate::{DecodedTransaction, Eip1559Transaction, LegacyTransaction, SignatureParts, TransactionError};
use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Address, Bytes, TxKind};
use rp_convert::{value_as_u128, value_as_u256, value_as_u64};
use serde_json::Value;
use std::str::FromStr;

impl DecodedTransaction {
    /// Parses a transaction type wrapper: a map holding the content under a
    /// single recognized variant key.
    ///
    /// Wrappers with zero keys, several keys, or an unrecognized key are
    /// rejected.
    pub fn from_tx_wrapper(wrapper: &Value) -> Result<Self, TransactionError> {
        let map = wrapper.as_object().ok_or(TransactionError::MalformedWrapper)?;
        let (tag, content) = match (map.len(), map.iter().next()) {
            (1, Some(entry)) => entry,
            _ => return Err(TransactionError::MalformedWrapper),
        };

        match tag.as_str() {
            "Legacy" => Ok(Self::Legacy(LegacyTransaction::from_value(content)?)),
            "Eip1559" => Ok(Self::Eip1559(Eip1559Transaction::from_value(content)?)),
            other => Err(TransactionError::UnsupportedVariant(other.to_string())),
        }
    }
}

impl LegacyTransaction {
    fn from_value(content: &Value) -> Result<Self, TransactionError> {
        Ok(Self {
            chain_id: value_as_u64(content.get("chainId"))?,
            nonce: value_as_u64(content.get("nonce"))?,
            gas: value_as_u64(content.get("gas"))?,
            to: parse_to(content.get("to"))?,
            value: value_as_u256(content.get("value"))?,
            input: parse_input(content.get("input"))?,
            gas_price: value_as_u128(content.get("gasPrice"))?,
        })
    }
}

impl Eip1559Transaction {
    fn from_value(content: &Value) -> Result<Self, TransactionError> {
        Ok(Self {
            chain_id: value_as_u64(content.get("chainId"))?,
            nonce: value_as_u64(content.get("nonce"))?,
            gas: value_as_u64(content.get("gas"))?,
            to: parse_to(content.get("to"))?,
            value: value_as_u256(content.get("value"))?,
            input: parse_input(content.get("input"))?,
            max_fee_per_gas: value_as_u128(content.get("maxFeePerGas"))?,
            max_priority_fee_per_gas: value_as_u128(content.get("maxPriorityFeePerGas"))?,
            access_list: parse_access_list(content.get("accessList"))?,
        })
    }
}

impl SignatureParts {
    /// Parses the 3-element `[r, s, v]` signature attached to a record.
    pub fn from_value(value: &Value) -> Result<Self, TransactionError> {
        let parts = value
            .as_array()
            .filter(|parts| parts.len() == 3)
            .ok_or_else(|| TransactionError::invalid_field("signature", "expected 3 elements"))?;
        Ok(Self {
            r: value_as_u256(parts.first())?,
            s: value_as_u256(parts.get(1))?,
            v: value_as_u64(parts.get(2))?,
        })
    }
}

fn parse_to(value: Option<&Value>) -> Result<TxKind, TransactionError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(TxKind::Create),
        Some(value) => value,
    };
    let hex = value.as_str().ok_or_else(|| TransactionError::invalid_field("to", "expected a hex address"))?;
    Address::from_str(hex).map(TxKind::Call).map_err(|e| TransactionError::invalid_field("to", e))
}

fn parse_input(value: Option<&Value>) -> Result<Bytes, TransactionError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(Bytes::new()),
        Some(value) => value,
    };
    let hex = value.as_str().ok_or_else(|| TransactionError::invalid_field("input", "expected hex bytes"))?;
    Bytes::from_str(hex).map_err(|e| TransactionError::invalid_field("input", e))
}

fn parse_access_list(value: Option<&Value>) -> Result<AccessList, TransactionError> {
    match value {
        None | Some(Value::Null) => Ok(AccessList::default()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|e| TransactionError::invalid_field("accessList", e))
        }
    }
}

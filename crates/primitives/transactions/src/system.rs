//! System-transaction adaptation.
//!
//! System transactions are injected by the chain itself and carry no
//! signature. The execution node accepts them through its impersonated
//! sender mechanism, so the adapter turns the decoded content into a call
//! object with a synthetic sender and a flat gas ceiling.

use crate::{DecodedTransaction, TransactionError};
use alloy::primitives::TxKind;
use serde_json::{json, Map, Value};

/// Synthetic sender address injected into every system transaction.
pub const SYSTEM_TX_SENDER: &str = "0x2222222222222222222222222222222222222222";

/// Flat gas ceiling applied to system transactions.
pub const SYSTEM_TX_GAS_LIMIT: u64 = 300_000;

/// Adapts a system transaction's type wrapper into an execution-node call
/// object: decoded fields, hex recipient, hex value, empty signature list,
/// plus the injected `from` and `gasLimit`.
pub fn adapt_system_tx(tx_wrapper: &Value) -> Result<Value, TransactionError> {
    let tx = DecodedTransaction::from_tx_wrapper(tx_wrapper)?;
    let mut call = to_call_object(&tx)?;
    call.insert("from".to_string(), json!(SYSTEM_TX_SENDER));
    call.insert("gasLimit".to_string(), json!(SYSTEM_TX_GAS_LIMIT));
    Ok(Value::Object(call))
}

fn fee_field(field: &'static str, fee: u128) -> Result<Value, TransactionError> {
    u64::try_from(fee).map(Value::from).map_err(|_| TransactionError::invalid_field(field, "value too large"))
}

fn to_call_object(tx: &DecodedTransaction) -> Result<Map<String, Value>, TransactionError> {
    let (chain_id, nonce, gas, to, value, input) = match tx {
        DecodedTransaction::Legacy(tx) => (tx.chain_id, tx.nonce, tx.gas, tx.to, tx.value, &tx.input),
        DecodedTransaction::Eip1559(tx) => (tx.chain_id, tx.nonce, tx.gas, tx.to, tx.value, &tx.input),
    };
    let TxKind::Call(to) = to else {
        return Err(TransactionError::invalid_field("to", "system transaction without a recipient"));
    };

    let mut call = Map::new();
    call.insert("chainId".to_string(), json!(chain_id));
    call.insert("nonce".to_string(), json!(nonce));
    call.insert("gas".to_string(), json!(gas));
    call.insert("to".to_string(), json!(format!("{to:#x}")));
    call.insert("value".to_string(), json!(format!("{value:#x}")));
    call.insert("data".to_string(), json!(input.to_string()));
    call.insert("signature".to_string(), json!([]));

    match tx {
        DecodedTransaction::Legacy(tx) => {
            call.insert("gasPrice".to_string(), fee_field("gasPrice", tx.gas_price)?);
        }
        DecodedTransaction::Eip1559(tx) => {
            call.insert("type".to_string(), json!(2));
            call.insert("maxFeePerGas".to_string(), fee_field("maxFeePerGas", tx.max_fee_per_gas)?);
            call.insert("maxPriorityFeePerGas".to_string(), fee_field("maxPriorityFeePerGas", tx.max_priority_fee_per_gas)?);
            let access_list =
                serde_json::to_value(&tx.access_list).map_err(|e| TransactionError::invalid_field("accessList", e))?;
            call.insert("accessList".to_string(), access_list);
        }
    }
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_adapt_legacy_system_tx() {
        let wrapper = json!({
            "Legacy": {
                "chainId": "0x3e7",
                "nonce": "0x01",
                "gas": "0x5208",
                "to": "0x5555555555555555555555555555555555555555",
                "value": "0x64",
                "input": "0xabcd",
                "gasPrice": "0x05f5e100",
            }
        });
        let call = adapt_system_tx(&wrapper).unwrap();

        assert_eq!(call["from"], json!(SYSTEM_TX_SENDER));
        assert_eq!(call["gasLimit"], json!(300_000));
        assert_eq!(call["to"], json!("0x5555555555555555555555555555555555555555"));
        assert_eq!(call["value"], json!("0x64"));
        assert_eq!(call["data"], json!("0xabcd"));
        assert_eq!(call["gasPrice"], json!(100_000_000));
        assert_eq!(call["signature"], json!([]));
        assert!(call.get("type").is_none());
    }

    #[test]
    fn test_adapt_eip1559_system_tx() {
        let wrapper = json!({
            "Eip1559": {
                "chainId": "0x3e7",
                "to": "0x2222222222222222222222222222222222222222",
                "maxFeePerGas": "0x02",
                "maxPriorityFeePerGas": "0x01",
            }
        });
        let call = adapt_system_tx(&wrapper).unwrap();

        assert_eq!(call["type"], json!(2));
        assert_eq!(call["maxFeePerGas"], json!(2));
        assert_eq!(call["value"], json!("0x0"));
        assert_eq!(call["accessList"], json!([]));
    }

    #[test]
    fn test_system_tx_requires_recipient() {
        let wrapper = json!({ "Legacy": { "gasPrice": "0x01" } });
        assert_matches!(adapt_system_tx(&wrapper), Err(TransactionError::InvalidField { field: "to", .. }));
    }
}

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Everything needed to advance the execution node by one block.
///
/// Serializes as the five-tuple
/// `[timestamp, gasLimit, baseFeePerGas, systemTxs, rawTxs]` expected by
/// the node's batched replay method.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayInstruction {
    pub timestamp: u64,
    pub gas_limit: u64,
    pub base_fee_per_gas: u64,
    /// Impersonated-sender call objects, in block order.
    pub system_txs: Vec<Value>,
    /// `0x`-hex raw transaction encodings, in block order.
    pub raw_txs: Vec<String>,
}

impl Serialize for ReplayInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(5)?;
        tuple.serialize_element(&self.timestamp)?;
        tuple.serialize_element(&self.gas_limit)?;
        tuple.serialize_element(&self.base_fee_per_gas)?;
        tuple.serialize_element(&self.system_txs)?;
        tuple.serialize_element(&self.raw_txs)?;
        tuple.end()
    }
}

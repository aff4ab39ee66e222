//! Snapshot file decoding.

use crate::{BlockHeader, SnapshotBlock, SnapshotError, SnapshotTransaction, SystemTransaction};
use rp_convert::{msgpack_to_json, normalize_buffers, value_as_u64};
use rp_transactions::{DecodedTransaction, SignatureParts};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Tag naming the node implementation that produced the block records.
/// Anything else is an unrecoverable format error for the file.
pub const BLOCK_WRAPPER_TAG: &str = "Reth115";

/// Reads and decodes a snapshot file.
pub fn read_snapshot_file(path: &Path) -> Result<Vec<SnapshotBlock>, SnapshotError> {
    let bytes = std::fs::read(path).map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })?;
    decode_snapshot(&bytes)
}

/// Decodes a compressed snapshot payload into its block records.
///
/// The payload is an lz4 frame wrapping a MessagePack value: either a single
/// block record or a list of them, in height order.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Vec<SnapshotBlock>, SnapshotError> {
    let mut decompressed = Vec::new();
    lz4_flex::frame::FrameDecoder::new(bytes)
        .read_to_end(&mut decompressed)
        .map_err(SnapshotError::Decompress)?;

    let value =
        rmpv::decode::read_value(&mut decompressed.as_slice()).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    let value = normalize_buffers(msgpack_to_json(value)?);

    match value {
        Value::Array(records) => records.iter().map(parse_block).collect(),
        single => Ok(vec![parse_block(&single)?]),
    }
}

fn field<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    value.and_then(|v| v.get(key))
}

fn hex_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(ToString::to_string)
}

fn parse_block(record: &Value) -> Result<SnapshotBlock, SnapshotError> {
    let record = record.as_object().ok_or_else(|| SnapshotError::Format("block record is not a map".to_string()))?;
    let block = record.get("block").ok_or_else(|| SnapshotError::Format("missing block entry".to_string()))?;
    let wrapped = block.get(BLOCK_WRAPPER_TAG).ok_or_else(|| {
        SnapshotError::Format(format!("unrecognized block wrapper, expected a {BLOCK_WRAPPER_TAG} entry"))
    })?;

    // The block hash sits on the outer header wrapper, the header fields one
    // level below it.
    let header_wrapper = wrapped.get("header");
    let header = field(header_wrapper, "header");

    let number = value_as_u64(field(header, "number"))?;
    let timestamp = value_as_u64(field(header, "timestamp"))?;

    let transactions = field(wrapped.get("body"), "transactions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(parse_transaction)
        .collect::<Result<_, _>>()?;

    let system_txs = record
        .get("system_txs")
        .and_then(Value::as_array)
        .ok_or_else(|| SnapshotError::Format("missing system_txs entry".to_string()))?
        .iter()
        .map(parse_system_tx)
        .collect::<Result<_, _>>()?;

    Ok(SnapshotBlock {
        header: BlockHeader {
            hash: hex_field(field(header_wrapper, "hash")),
            parent_hash: hex_field(field(header, "parentHash")),
            sha3_uncles: hex_field(field(header, "sha3Uncles")),
            miner: hex_field(field(header, "miner")),
            state_root: hex_field(field(header, "stateRoot")),
            transactions_root: hex_field(field(header, "transactionsRoot")),
            receipts_root: hex_field(field(header, "receiptsRoot")),
            number,
            gas_limit: value_as_u64(field(header, "gasLimit"))?,
            gas_used: value_as_u64(field(header, "gasUsed"))?,
            timestamp,
            extra_data: hex_field(field(header, "extraData")),
            base_fee_per_gas: value_as_u64(field(header, "baseFeePerGas"))?,
        },
        transactions,
        system_txs,
        datetime: (timestamp != 0)
            .then(|| chrono::DateTime::from_timestamp(timestamp as i64, 0))
            .flatten()
            .map(|dt| dt.to_rfc3339()),
    })
}

fn parse_transaction(entry: &Value) -> Result<SnapshotTransaction, SnapshotError> {
    let wrapper = entry
        .get("transaction")
        .ok_or_else(|| SnapshotError::Format("transaction record without a transaction entry".to_string()))?;
    let signature = entry
        .get("signature")
        .ok_or_else(|| SnapshotError::Format("transaction record without a signature".to_string()))?;

    Ok(SnapshotTransaction {
        transaction: DecodedTransaction::from_tx_wrapper(wrapper)?,
        signature: SignatureParts::from_value(signature)?,
    })
}

fn parse_system_tx(entry: &Value) -> Result<SystemTransaction, SnapshotError> {
    let tx =
        entry.get("tx").ok_or_else(|| SnapshotError::Format("system transaction without a tx entry".to_string()))?;
    Ok(SystemTransaction { tx: tx.clone() })
}

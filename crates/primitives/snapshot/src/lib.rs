//! Snapshot primitives: decoding block snapshot files into structured
//! records, addressing them on shared storage, and summarizing decoded
//! batches for progress reporting.
//!
//! A snapshot file is an lz4-frame-compressed MessagePack payload holding
//! either a single block record or a list of them. Each record wraps the
//! block under a tag naming the node implementation that produced it, with
//! most byte-valued leaves Buffer-tagged (see [`rp_convert`]).

mod decode;
mod path;
mod summary;

pub use decode::{decode_snapshot, read_snapshot_file, BLOCK_WRAPPER_TAG};
pub use path::{shard, snapshot_path, SNAPSHOT_EXTENSION};
pub use summary::{summarize, BlockSummary};

use rp_transactions::{DecodedTransaction, SignatureParts, TransactionError};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decompress snapshot: {0}")]
    Decompress(std::io::Error),
    #[error("Failed to deserialize snapshot: {0}")]
    Decode(String),
    #[error("Invalid snapshot format: {0}")]
    Format(String),
    #[error(transparent)]
    Convert(#[from] rp_convert::ConvertError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// Header of a decoded snapshot block.
///
/// Byte-valued fields are normalized `0x` hex strings; numeric fields are
/// big-endian integers, zero when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// The hash of this block.
    pub hash: Option<String>,
    /// The hash of this block's parent.
    pub parent_hash: Option<String>,
    pub sha3_uncles: Option<String>,
    /// Address of the block producer.
    pub miner: Option<String>,
    /// The state commitment after this block.
    pub state_root: Option<String>,
    pub transactions_root: Option<String>,
    pub receipts_root: Option<String>,
    /// The number (height) of this block.
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    /// Unix timestamp (seconds) when the block was produced.
    pub timestamp: u64,
    pub extra_data: Option<String>,
    pub base_fee_per_gas: u64,
}

/// A user transaction together with its detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTransaction {
    pub transaction: DecodedTransaction,
    pub signature: SignatureParts,
}

/// A system transaction record: content only, no signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTransaction {
    /// The transaction type wrapper, normalized.
    pub tx: Value,
}

/// One block decoded from a snapshot file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotBlock {
    pub header: BlockHeader,
    pub transactions: Vec<SnapshotTransaction>,
    pub system_txs: Vec<SystemTransaction>,
    /// ISO-8601 rendering of the header timestamp, when non-zero.
    pub datetime: Option<String>,
}

impl SnapshotBlock {
    pub fn number(&self) -> u64 {
        self.header.number
    }
}

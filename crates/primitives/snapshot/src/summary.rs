//! Progress summaries over decoded block batches.

use crate::SnapshotBlock;
use std::fmt;

/// Aggregate statistics over a batch of decoded blocks. Informational only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSummary {
    pub total_blocks: usize,
    pub total_transactions: usize,
    pub average_gas_used: f64,
    pub block_numbers: Vec<u64>,
    /// First and last non-null block datetime in the batch.
    pub first_datetime: Option<String>,
    pub last_datetime: Option<String>,
}

pub fn summarize(blocks: &[SnapshotBlock]) -> BlockSummary {
    if blocks.is_empty() {
        return BlockSummary::default();
    }

    let total_gas_used: u64 = blocks.iter().map(|b| b.header.gas_used).sum();
    BlockSummary {
        total_blocks: blocks.len(),
        total_transactions: blocks.iter().map(|b| b.transactions.len()).sum(),
        average_gas_used: total_gas_used as f64 / blocks.len() as f64,
        block_numbers: blocks.iter().map(SnapshotBlock::number).collect(),
        first_datetime: blocks.iter().find_map(|b| b.datetime.clone()),
        last_datetime: blocks.iter().rev().find_map(|b| b.datetime.clone()),
    }
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} blocks ({:?}), {} txs, avg gas {:.0}, time range {} -> {}",
            self.total_blocks,
            self.block_numbers,
            self.total_transactions,
            self.average_gas_used,
            rp_utils::fmt_option(self.first_datetime.as_deref(), "?"),
            rp_utils::fmt_option(self.last_datetime.as_deref(), "?"),
        )
    }
}

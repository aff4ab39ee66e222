//! The decode → reconstruct → submit consumer.

use crate::QueueItem;
use alloy::primitives::hex;
use anyhow::Context;
use rc_exec::{ExecutionClient, ReplayInstruction};
use rp_snapshot::{read_snapshot_file, summarize, SnapshotBlock};
use rp_transactions::{adapt_system_tx, to_raw_transaction, TransactionError};
use rp_utils::service::ServiceContext;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Builds the replay instruction advancing the execution node by one block:
/// header parameters, adapted system transactions, and the raw encodings of
/// every user transaction, all in block order.
pub fn build_instruction(block: &SnapshotBlock) -> Result<ReplayInstruction, TransactionError> {
    let raw_txs = block
        .transactions
        .iter()
        .map(|tx| to_raw_transaction(&tx.transaction, &tx.signature).map(|raw| hex::encode_prefixed(&raw)))
        .collect::<Result<_, _>>()?;
    let system_txs = block.system_txs.iter().map(|tx| adapt_system_tx(&tx.tx)).collect::<Result<_, _>>()?;

    Ok(ReplayInstruction {
        timestamp: block.header.timestamp,
        gas_limit: block.header.gas_limit,
        base_fee_per_gas: block.header.base_fee_per_gas,
        system_txs,
        raw_txs,
    })
}

/// Consumer half of the replay pipeline. Strictly serial: a file's blocks
/// are submitted before the next file is dequeued.
///
/// Decode and submission failures are fatal; a batch rejection in
/// particular must not be retried since the node may have applied part of
/// the chunk.
pub(crate) async fn consumer_task(
    exec: Arc<ExecutionClient>,
    mut queue: UnboundedReceiver<QueueItem>,
    progress_interval: u64,
    ctx: ServiceContext,
) -> anyhow::Result<()> {
    let mut pending: Vec<ReplayInstruction> = Vec::new();

    while let Some(Some(item)) = ctx.run_until_cancelled(queue.recv()).await {
        let Some(path) = item else { break };

        tracing::debug!("replaying {}", path.display());
        let blocks =
            read_snapshot_file(&path).with_context(|| format!("Decoding snapshot file {}", path.display()))?;
        for block in &blocks {
            pending.push(build_instruction(block).with_context(|| format!("Reconstructing block #{}", block.number()))?);
        }

        // One submission per dequeued file, deliberately not batched across
        // files: memory stays bounded and the node height tracks the cursor.
        if !pending.is_empty() {
            exec.submit_setup_blocks(&pending).await.context("Submitting replay instructions")?;
            pending.clear();
        }

        if let Some(last) = blocks.last() {
            if progress_interval != 0 && last.number() % progress_interval == 0 {
                tracing::info!("🔗 Replay is at {}", summarize(&blocks));
            }
        }
    }

    // Shutdown (sentinel or cancellation): flush anything not yet submitted.
    if !pending.is_empty() {
        exec.submit_setup_blocks(&pending).await.context("Submitting replay instructions")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_snapshot::{BlockHeader, SnapshotTransaction, SystemTransaction};
    use rp_transactions::{DecodedTransaction, SignatureParts, SYSTEM_TX_SENDER};
    use serde_json::json;

    fn snapshot_block() -> SnapshotBlock {
        let legacy = json!({
            "Legacy": {
                "chainId": "0x3e6",
                "nonce": "0x",
                "gas": "0x5208",
                "to": "0x0000000000000000000000000000000000000001",
                "value": "0x",
                "input": "0x",
                "gasPrice": "0x01",
            }
        });
        SnapshotBlock {
            header: BlockHeader {
                number: 1000,
                gas_limit: 30_000_000,
                gas_used: 21_000,
                timestamp: 1_700_000_000,
                base_fee_per_gas: 100_000_000,
                ..Default::default()
            },
            transactions: vec![SnapshotTransaction {
                transaction: DecodedTransaction::from_tx_wrapper(&legacy).unwrap(),
                signature: SignatureParts {
                    r: alloy::primitives::U256::from(2),
                    s: alloy::primitives::U256::from(3),
                    v: 0,
                },
            }],
            system_txs: vec![SystemTransaction { tx: legacy.clone() }],
            datetime: None,
        }
    }

    #[test]
    fn test_build_instruction() {
        let instruction = build_instruction(&snapshot_block()).unwrap();

        assert_eq!(instruction.timestamp, 1_700_000_000);
        assert_eq!(instruction.gas_limit, 30_000_000);
        assert_eq!(instruction.base_fee_per_gas, 100_000_000);

        assert_eq!(instruction.raw_txs.len(), 1);
        assert!(instruction.raw_txs[0].starts_with("0x"));

        assert_eq!(instruction.system_txs.len(), 1);
        assert_eq!(instruction.system_txs[0]["from"], json!(SYSTEM_TX_SENDER));
        assert_eq!(instruction.system_txs[0]["gasLimit"], json!(300_000));
    }

    #[test]
    fn test_build_instruction_rejects_bad_system_tx() {
        let mut block = snapshot_block();
        block.system_txs = vec![SystemTransaction { tx: json!({ "Eip4844": {} }) }];
        assert!(build_instruction(&block).is_err());
    }
}

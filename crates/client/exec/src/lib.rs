//! Client for the local execution node.
//!
//! Reads go through the standard chain RPC (`eth_blockNumber`,
//! `eth_getBlockByNumber`). Replay instructions go through the node's
//! custom `anvil_setupBlock` method, which accepts a batch of per-block
//! five-tuples in one request and answers with one response object per
//! tuple.

mod error;
mod instruction;

pub use error::ExecClientError;
pub use instruction::ReplayInstruction;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::B256;
use alloy::providers::{Provider, ProviderBuilder, ReqwestProvider};
use alloy::rpc::types::BlockTransactionsKind;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Custom batched replay method exposed by the execution node.
pub const SETUP_BLOCK_METHOD: &str = "anvil_setupBlock";

/// Maximum number of replay instructions submitted per RPC request.
pub const SETUP_BLOCK_CHUNK_SIZE: usize = 100;

/// Read-only source of block hashes, implemented by every RPC endpoint the
/// divergence checks compare.
#[async_trait]
pub trait BlockHashSource: Send + Sync {
    /// Current chain height of the endpoint.
    async fn block_number(&self) -> Result<u64, ExecClientError>;
    /// Hash of the block at `block_n`, or [`None`] if the endpoint does not
    /// have that block yet.
    async fn block_hash(&self, block_n: u64) -> Result<Option<B256>, ExecClientError>;
}

/// Client over one execution-node (or mirror) RPC endpoint.
pub struct ExecutionClient {
    provider: ReqwestProvider,
    http: reqwest::Client,
    rpc_url: Url,
}

impl ExecutionClient {
    pub fn new(rpc_url: Url) -> Self {
        Self { provider: ProviderBuilder::new().on_http(rpc_url.clone()), http: reqwest::Client::new(), rpc_url }
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub async fn block_number(&self) -> Result<u64, ExecClientError> {
        self.provider.get_block_number().await.map_err(|e| ExecClientError::Rpc(e.to_string()))
    }

    pub async fn block_hash(&self, block_n: u64) -> Result<Option<B256>, ExecClientError> {
        self.provider
            .get_block_by_number(BlockNumberOrTag::Number(block_n), BlockTransactionsKind::Hashes)
            .await
            .map(|block| block.map(|block| block.header.hash))
            .map_err(|e| ExecClientError::Rpc(e.to_string()))
    }

    /// Submits replay instructions to the node, at most
    /// [`SETUP_BLOCK_CHUNK_SIZE`] per request, preserving order within and
    /// across chunks.
    ///
    /// Every element of the response array must be free of an `error`
    /// member. A batch error is fatal: whether earlier items of the chunk
    /// were applied is node-defined, so no retry is attempted.
    pub async fn submit_setup_blocks(&self, instructions: &[ReplayInstruction]) -> Result<(), ExecClientError> {
        for (chunk_n, chunk) in instructions.chunks(SETUP_BLOCK_CHUNK_SIZE).enumerate() {
            let id = chunk_n * SETUP_BLOCK_CHUNK_SIZE + 1;
            let request = serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": SETUP_BLOCK_METHOD,
                "params": chunk,
            });

            tracing::debug!("submitting {} replay instructions (request id {id})", chunk.len());
            let responses: Vec<Value> =
                self.http.post(self.rpc_url.clone()).json(&request).send().await?.error_for_status()?.json().await?;

            for response in &responses {
                if let Some(error) = response.get("error") {
                    return Err(ExecClientError::Batch { id, error: error.clone() });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlockHashSource for ExecutionClient {
    async fn block_number(&self) -> Result<u64, ExecClientError> {
        ExecutionClient::block_number(self).await
    }

    async fn block_hash(&self, block_n: u64) -> Result<Option<B256>, ExecClientError> {
        ExecutionClient::block_hash(self, block_n).await
    }
}

#[cfg(test)]
mod tests;

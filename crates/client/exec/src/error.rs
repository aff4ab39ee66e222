use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecClientError {
    #[error("Execution node RPC error: {0}")]
    Rpc(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Batch request {id} rejected by the node: {error}")]
    Batch { id: usize, error: Value },
}

impl ExecClientError {
    /// Returns true if the error is a transient network/transport failure
    /// worth retrying with backoff. Batch rejections are never retried:
    /// whether earlier items in the batch were applied is node-defined.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Http(_))
    }
}

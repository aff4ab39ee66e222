//! Sync worker wiring.

use crate::{discovery::discovery_task, replay::consumer_task};
use anyhow::Context;
use rc_exec::ExecutionClient;
use rp_utils::service::ServiceContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Storage roots probed for snapshot files, in priority order.
    pub data_dirs: Vec<PathBuf>,
    /// How long to wait before re-probing a height that has no file yet.
    pub poll_interval: Duration,
    /// Emit a progress summary whenever a replayed file ends on a block
    /// number divisible by this.
    pub progress_interval: u64,
}

impl SyncConfig {
    pub fn data_dirs(self, data_dirs: Vec<PathBuf>) -> Self {
        Self { data_dirs, ..self }
    }
    pub fn poll_interval(self, poll_interval: Duration) -> Self {
        Self { poll_interval, ..self }
    }
    pub fn progress_interval(self, progress_interval: u64) -> Self {
        Self { progress_interval, ..self }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { data_dirs: vec![], poll_interval: Duration::from_secs(1), progress_interval: 1000 }
    }
}

/// Runs the replay sync until cancellation: a discovery producer and a
/// decode/submit consumer joined by an unbounded FIFO.
///
/// The height cursor starts one past the execution node's current height,
/// so a restarted node resumes exactly where the replayed chain stops. The
/// first error of either task fails the worker.
pub async fn sync_worker(exec: Arc<ExecutionClient>, config: SyncConfig, ctx: ServiceContext) -> anyhow::Result<()> {
    anyhow::ensure!(!config.data_dirs.is_empty(), "no snapshot storage root configured");

    let start_height = exec.block_number().await.context("Getting execution node height")? + 1;
    tracing::info!("🔗 Starting block replay at height #{start_height}");

    let (queue_tx, queue_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut join_set = JoinSet::new();
    join_set.spawn(discovery_task(config.clone(), start_height, queue_tx, ctx.clone()));
    join_set.spawn(consumer_task(exec, queue_rx, config.progress_interval, ctx));

    while let Some(res) = join_set.join_next().await {
        res??;
    }
    Ok(())
}

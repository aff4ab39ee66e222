//! Snapshot file discovery.

use crate::{sync::SyncConfig, QueueItem};
use rp_snapshot::snapshot_path;
use rp_utils::service::ServiceContext;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Probes the configured storage roots, in order, for the snapshot file at
/// `height`.
pub(crate) fn find_snapshot(roots: &[PathBuf], height: u64) -> Option<PathBuf> {
    roots.iter().map(|root| snapshot_path(root, height)).find(|path| path.exists())
}

/// Producer half of the replay pipeline.
///
/// Owns the height cursor: it advances by exactly one only once a file for
/// the current height was found and enqueued. A miss across every root is
/// not an error, it just means the snapshot has not been published yet, so
/// the task waits and retries the same height. On cancellation the sentinel
/// is enqueued so the consumer can flush and stop.
pub(crate) async fn discovery_task(
    config: SyncConfig,
    start_height: u64,
    queue: UnboundedSender<QueueItem>,
    ctx: ServiceContext,
) -> anyhow::Result<()> {
    let mut height = start_height;
    while !ctx.is_cancelled() {
        match find_snapshot(&config.data_dirs, height) {
            Some(path) => {
                tracing::debug!("found snapshot #{height} at {}", path.display());
                if queue.send(Some(path)).is_err() {
                    // Consumer is gone; its own error already tears the sync
                    // worker down.
                    return Ok(());
                }
                height += 1;
            }
            None => {
                tracing::debug!("waiting for snapshot #{height}");
                if ctx.run_until_cancelled(tokio::time::sleep(config.poll_interval)).await.is_none() {
                    break;
                }
            }
        }
    }
    let _ = queue.send(None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_snapshot(root: &std::path::Path, height: u64) -> PathBuf {
        let path = snapshot_path(root, height);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"payload").unwrap();
        path
    }

    fn config_for(roots: &[&TempDir]) -> SyncConfig {
        SyncConfig::default()
            .data_dirs(roots.iter().map(|d| d.path().to_path_buf()).collect())
            .poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_discovers_heights_in_order_across_roots() {
        let (root_a, root_b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        write_snapshot(root_b.path(), 5);
        let expected_6 = write_snapshot(root_a.path(), 6);
        // Height 6 also exists in the second root; the first root wins.
        write_snapshot(root_b.path(), 6);

        let ctx = ServiceContext::new();
        let (queue_tx, mut queue_rx) = tokio::sync::mpsc::unbounded_channel();
        let task = tokio::spawn(discovery_task(config_for(&[&root_a, &root_b]), 5, queue_tx, ctx.clone()));

        let first = queue_rx.recv().await.unwrap().unwrap();
        assert_eq!(first, snapshot_path(root_b.path(), 5));
        let second = queue_rx.recv().await.unwrap().unwrap();
        assert_eq!(second, expected_6);

        ctx.cancel_global();
        task.await.unwrap().unwrap();
        // Sentinel closes the stream.
        assert_eq!(queue_rx.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_waits_without_advancing_on_miss() {
        let root = TempDir::new().unwrap();
        let ctx = ServiceContext::new();
        let (queue_tx, mut queue_rx) = tokio::sync::mpsc::unbounded_channel();
        let task = tokio::spawn(discovery_task(config_for(&[&root]), 42, queue_tx, ctx.clone()));

        // Nothing to find yet: the cursor must hold at 42.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(queue_rx.try_recv().is_err());

        let expected = write_snapshot(root.path(), 42);
        let found = tokio::time::timeout(Duration::from_secs(1), queue_rx.recv()).await.unwrap().unwrap();
        assert_eq!(found, Some(expected));

        ctx.cancel_global();
        task.await.unwrap().unwrap();
    }
}

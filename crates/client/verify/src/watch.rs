//! Linear divergence watcher.

use alloy::primitives::B256;
use anyhow::Context;
use rc_exec::BlockHashSource;
use rp_utils::service::ServiceContext;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// First height to compare.
    pub start_height: u64,
    /// Distance between compared heights.
    pub stride: u64,
    /// Fixed backoff while the target cannot serve the probed height, either
    /// because it has not replayed it yet or because of a transient network
    /// failure.
    pub retry_delay: Duration,
}

impl WatchConfig {
    pub fn start_height(self, start_height: u64) -> Self {
        Self { start_height, ..self }
    }
    pub fn stride(self, stride: u64) -> Self {
        Self { stride, ..self }
    }
    pub fn retry_delay(self, retry_delay: Duration) -> Self {
        Self { retry_delay, ..self }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { start_height: 75_000, stride: 100, retry_delay: Duration::from_secs(1) }
    }
}

/// Compares the replay target against the canonical mirror every
/// `config.stride` blocks, pacing itself on the target's progress.
///
/// This is a tripwire, not a resumable process: the first mismatch cancels
/// the whole node, since replaying past a divergence is pointless. Transient
/// target read failures are retried forever with a fixed backoff; mirror
/// read failures and format errors propagate.
pub async fn watch_divergence(
    mirror: &dyn BlockHashSource,
    target: &dyn BlockHashSource,
    config: WatchConfig,
    ctx: ServiceContext,
) -> anyhow::Result<()> {
    let mut height = config.start_height;
    tracing::info!("🔍 Watching for divergence from height #{height}, every {} blocks", config.stride);

    loop {
        let Some(target_hash) = wait_for_target_block(target, height, config.retry_delay, &ctx).await? else {
            return Ok(());
        };
        let mirror_hash = mirror.block_hash(height).await.context("Reading canonical block hash")?;

        if mirror_hash != Some(target_hash) {
            tracing::error!(
                "💥 Replay diverges from the canonical chain at #{height}: mirror {}, target {target_hash}",
                rp_utils::fmt_option(mirror_hash, "has no such block"),
            );
            ctx.cancel_global();
            return Ok(());
        }

        tracing::debug!("#{height} valid");
        height += config.stride;
    }
}

/// Polls the target until it serves a hash for `height`.
///
/// Returns [`None`] if the service is cancelled while waiting.
async fn wait_for_target_block(
    target: &dyn BlockHashSource,
    height: u64,
    retry_delay: Duration,
    ctx: &ServiceContext,
) -> anyhow::Result<Option<B256>> {
    while !ctx.is_cancelled() {
        match target.block_hash(height).await {
            Ok(Some(hash)) => return Ok(Some(hash)),
            Ok(None) => tracing::trace!("target has not replayed #{height} yet"),
            Err(e) if e.is_recoverable() => tracing::debug!("transient error reading target #{height}: {e}"),
            Err(e) => return Err(e).context("Reading target block hash"),
        }
        if ctx.run_until_cancelled(tokio::time::sleep(retry_delay)).await.is_none() {
            break;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rc_exec::ExecClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Hash chains for tests: height-derived hashes, diverging (or not) at a
    /// given height, with optional scripted failures before first success.
    struct ScriptedChain {
        head: u64,
        diverge_at: Option<u64>,
        transient_failures: AtomicUsize,
        missing_reads: AtomicUsize,
    }

    impl ScriptedChain {
        fn new(head: u64, diverge_at: Option<u64>) -> Self {
            Self { head, diverge_at, transient_failures: AtomicUsize::new(0), missing_reads: AtomicUsize::new(0) }
        }

        fn with_transient_failures(self, n: usize) -> Self {
            self.transient_failures.store(n, Ordering::SeqCst);
            self
        }

        fn with_missing_reads(self, n: usize) -> Self {
            self.missing_reads.store(n, Ordering::SeqCst);
            self
        }

        fn take(counter: &AtomicUsize) -> bool {
            counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
        }
    }

    #[async_trait]
    impl BlockHashSource for ScriptedChain {
        async fn block_number(&self) -> Result<u64, ExecClientError> {
            Ok(self.head)
        }

        async fn block_hash(&self, block_n: u64) -> Result<Option<B256>, ExecClientError> {
            if Self::take(&self.transient_failures) {
                return Err(ExecClientError::Rpc("connection refused".to_string()));
            }
            if Self::take(&self.missing_reads) || block_n > self.head {
                return Ok(None);
            }
            let tag = if self.diverge_at.is_some_and(|d| block_n >= d) { 0xff } else { 0x00 };
            let mut bytes = [tag; 32];
            bytes[..8].copy_from_slice(&block_n.to_be_bytes());
            Ok(Some(B256::from(bytes)))
        }
    }

    fn fast_config() -> WatchConfig {
        WatchConfig::default().start_height(100).stride(100).retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_divergence_cancels_the_node() {
        let mirror = ScriptedChain::new(10_000, None);
        let target = ScriptedChain::new(10_000, Some(300));
        let ctx = ServiceContext::new();

        watch_divergence(&mirror, &target, fast_config(), ctx.clone()).await.unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_transient_target_errors_are_retried() {
        let mirror = ScriptedChain::new(10_000, None);
        let target = ScriptedChain::new(10_000, Some(200)).with_transient_failures(3).with_missing_reads(2);
        let ctx = ServiceContext::new();

        watch_divergence(&mirror, &target, fast_config(), ctx.clone()).await.unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_mirror_errors_propagate() {
        let mirror = ScriptedChain::new(10_000, None).with_transient_failures(1);
        let target = ScriptedChain::new(10_000, None);
        let ctx = ServiceContext::new();

        let res = watch_divergence(&mirror, &target, fast_config(), ctx.clone()).await;
        assert!(res.is_err());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_wait() {
        let mirror = ScriptedChain::new(10_000, None);
        // Head is below the first probed height: the watcher waits forever.
        let target = ScriptedChain::new(50, None);
        let ctx = ServiceContext::new();

        let handle = {
            let ctx = ctx.clone();
            tokio::spawn(async move { watch_divergence(&mirror, &target, fast_config(), ctx).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        ctx.cancel_global();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_find_divergence_over_sources() {
        let mirror = ScriptedChain::new(10_000, None);
        let target = ScriptedChain::new(10_000, Some(4_242));
        assert_eq!(crate::find_divergence(&mirror, &target).await.unwrap(), 4_242);

        let clean = ScriptedChain::new(10_000, None);
        assert_eq!(crate::find_divergence(&mirror, &clean).await.unwrap(), 10_000);
    }
}

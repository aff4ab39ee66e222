//! Logarithmic divergence search.

use rc_exec::{BlockHashSource, ExecClientError};
use std::future::Future;
use std::ops::Range;

/// Binary-searches `range` for the lowest height at which `matches` is
/// false.
///
/// Assumes monotonicity: two chain histories never re-converge, so once
/// `matches` is false for some height it is false for every later one.
/// Returns the range's upper bound if every height matches.
pub async fn lowest_mismatch<F, Fut>(range: Range<u64>, mut matches: F) -> Result<u64, ExecClientError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<bool, ExecClientError>>,
{
    let Range { mut start, mut end } = range;
    while start < end {
        let mid = start + (end - start) / 2;
        if matches(mid).await? {
            // Midpoint still matches: the divergence, if any, is later.
            start = mid + 1;
        } else {
            end = mid;
        }
        tracing::debug!("bisecting divergence: [{start}, {end})");
    }
    Ok(start)
}

/// Finds the first height at which the canonical mirror and the replay
/// target disagree on block hash, searching from height 1 up to the
/// target's current head (exclusive).
pub async fn find_divergence(
    mirror: &dyn BlockHashSource,
    target: &dyn BlockHashSource,
) -> Result<u64, ExecClientError> {
    let end = target.block_number().await?;
    let diverged_at = lowest_mismatch(1..end, |height| async move {
        Ok(mirror.block_hash(height).await? == target.block_hash(height).await?)
    })
    .await?;

    if diverged_at == end {
        tracing::info!("🔍 No divergence up to target height #{end}");
    } else {
        tracing::info!("🔍 First diverging height: #{diverged_at}");
    }
    Ok(diverged_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    #[rstest]
    #[case(1, 1_000)]
    #[case(2, 1_000)]
    #[case(500, 1_000)]
    #[case(999, 1_000)]
    #[case(1, 2)]
    #[tokio::test]
    async fn test_finds_exact_divergence_height(#[case] k: u64, #[case] n: u64) {
        let result = lowest_mismatch(1..n, |i| async move { Ok(i < k) }).await.unwrap();
        assert_eq!(result, k);
    }

    #[rstest]
    #[case(1_000)]
    #[case(1)]
    #[tokio::test]
    async fn test_returns_upper_bound_when_nothing_diverges(#[case] n: u64) {
        let result = lowest_mismatch(1..n, |_| async { Ok(true) }).await.unwrap();
        assert_eq!(result, n);
    }

    #[tokio::test]
    async fn test_probe_count_is_logarithmic() {
        let probes = Cell::new(0u32);
        let result = lowest_mismatch(1..1_000_000, |i| {
            probes.set(probes.get() + 1);
            async move { Ok(i < 123_456) }
        })
        .await
        .unwrap();
        assert_eq!(result, 123_456);
        assert!(probes.get() <= 20, "expected ~log2(1e6) probes, made {}", probes.get());
    }

    #[tokio::test]
    async fn test_probe_errors_propagate() {
        let result =
            lowest_mismatch(1..100, |_| async { Err(ExecClientError::Rpc("connection refused".to_string())) }).await;
        assert!(result.is_err());
    }
}

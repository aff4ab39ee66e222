//! Deterministic addressing of snapshot files on shared storage.

use std::path::{Path, PathBuf};

pub const SNAPSHOT_EXTENSION: &str = "rmp.lz4";

/// Two-level directory shard for a block height: the enclosing million and
/// the enclosing thousand.
pub fn shard(height: u64) -> (u64, u64) {
    (height / 1_000_000 * 1_000_000, height / 1_000 * 1_000)
}

/// Path of the snapshot file for `height` under a storage root:
/// `root/{million}/{thousand}/{height}.rmp.lz4`.
pub fn snapshot_path(root: &Path, height: u64) -> PathBuf {
    let (millions, thousands) = shard(height);
    root.join(millions.to_string()).join(thousands.to_string()).join(format!("{height}.{SNAPSHOT_EXTENSION}"))
}

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "remora", about = "EVM block-snapshot replay node", version)]
pub struct Args {
    /// RPC endpoint of the local execution node.
    #[arg(long, env = "REMORA_EXEC_RPC_URL", value_name = "URL", default_value = "http://localhost:8545")]
    pub exec_rpc_url: Url,

    /// Read-only RPC endpoint of the canonical chain, used for divergence
    /// checks.
    #[arg(long, env = "REMORA_MIRROR_RPC_URL", value_name = "URL")]
    pub mirror_rpc_url: Option<Url>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay snapshot files into the execution node, watching for
    /// divergence along the way.
    Sync(SyncParams),
    /// Locate the lowest height at which the replayed chain diverges from
    /// the canonical chain, then exit.
    Bisect,
}

#[derive(Debug, ClapArgs)]
pub struct SyncParams {
    /// Snapshot storage root. Repeat to probe several roots in order.
    #[arg(long = "data-dir", env = "REMORA_DATA_DIR", value_name = "PATH", value_delimiter = ',', required = true)]
    pub data_dirs: Vec<PathBuf>,

    /// Seconds to wait before re-probing a missing snapshot file.
    #[arg(long, value_name = "SECONDS", default_value_t = 1)]
    pub poll_interval: u64,

    /// Disable the divergence watcher.
    #[arg(long)]
    pub no_watch: bool,

    /// First height compared by the divergence watcher.
    #[arg(long, value_name = "BLOCK", default_value_t = 75_000)]
    pub watch_start: u64,

    /// Blocks between two divergence checks.
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub watch_stride: u64,
}

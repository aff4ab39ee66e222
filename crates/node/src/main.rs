mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Args, Command, SyncParams};
use rc_exec::ExecutionClient;
use rc_sync::SyncConfig;
use rc_verify::WatchConfig;
use rp_utils::service::ServiceContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let exec = Arc::new(ExecutionClient::new(args.exec_rpc_url.clone()));

    match args.command {
        Command::Sync(ref params) => run_sync(&args, params, exec).await,
        Command::Bisect => run_bisect(&args, exec).await,
    }
}

fn mirror_client(args: &Args) -> anyhow::Result<Arc<ExecutionClient>> {
    let url: &Url = args.mirror_rpc_url.as_ref().context("--mirror-rpc-url is required")?;
    Ok(Arc::new(ExecutionClient::new(url.clone())))
}

async fn run_sync(args: &Args, params: &SyncParams, exec: Arc<ExecutionClient>) -> anyhow::Result<()> {
    let ctx = ServiceContext::new();
    spawn_ctrl_c_handler(ctx.clone());

    let sync_config = SyncConfig::default()
        .data_dirs(params.data_dirs.clone())
        .poll_interval(Duration::from_secs(params.poll_interval));

    let mut join_set = JoinSet::new();
    join_set.spawn(rc_sync::sync_worker(Arc::clone(&exec), sync_config, ctx.clone()));

    if !params.no_watch {
        let mirror = mirror_client(args).context("The divergence watcher needs a canonical RPC endpoint")?;
        let watch_config = WatchConfig::default().start_height(params.watch_start).stride(params.watch_stride);
        let ctx = ctx.clone();
        join_set
            .spawn(async move { rc_verify::watch_divergence(&*mirror, &*exec, watch_config, ctx).await });
    }

    // The first failed service takes the node down: dropping the JoinSet on
    // the error path aborts whatever is still running.
    while let Some(res) = join_set.join_next().await {
        res??;
    }
    Ok(())
}

async fn run_bisect(args: &Args, exec: Arc<ExecutionClient>) -> anyhow::Result<()> {
    let mirror = mirror_client(args)?;
    let diverged_at = rc_verify::find_divergence(&*mirror, &*exec).await.context("Searching for divergence")?;
    tracing::info!("🏁 Bisection finished at height #{diverged_at}");
    Ok(())
}

fn spawn_ctrl_c_handler(ctx: ServiceContext) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctx.cancel_global();
        }
    });
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ipc::IpcClient;
use registry::{Credential, RegistryClient};
use tokio::signal;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use peersync::{IdentityResolver, SyncConfig, SyncContext, spawn_sync_tasks};

#[derive(Parser)]
#[command(author, version, about = "Keeps a node connected to peers listed in an enode registry")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish our enode and add registry peers on a fixed schedule.
    Run,
    /// Print the node's own enode.
    NodeInfo,
    /// Publish our enode once.
    Publish,
    /// Add every registry peer once and print the outcome.
    Reconcile,
    /// Print the peer set currently held by the registry.
    Peers,
}

#[derive(Args, Clone, Debug, Default)]
struct ConfigArgs {
    /// Optional path to a TOML configuration file.
    #[arg(long, global = true, env = "PEERSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Path of the node's IPC socket (overrides config file).
    #[arg(long, global = true, env = "PEERSYNC_IPC_PATH")]
    ipc_path: Option<PathBuf>,

    /// Registry endpoint that accepts our enode (overrides config file).
    #[arg(long, global = true, env = "PEERSYNC_PUBLISH_URL")]
    publish_url: Option<String>,

    /// Registry endpoint listing registered enodes (overrides config file).
    #[arg(long, global = true, env = "PEERSYNC_FETCH_URL")]
    fetch_url: Option<String>,

    /// Value sent in the Authorization header (overrides config file).
    #[arg(long, global = true, env = "PEERSYNC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Seconds between publish runs (overrides config file).
    #[arg(long, global = true)]
    publish_interval_secs: Option<u64>,

    /// Seconds between reconcile runs (overrides config file).
    #[arg(long, global = true)]
    reconcile_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    match cli.command {
        Commands::Run => run(config).await?,
        Commands::NodeInfo => {
            let resolver = IdentityResolver::new(IpcClient::new(config.ipc_config()));
            let identity = resolver.resolve_own_identity().await?;
            println!("{identity}");
        }
        Commands::Publish => {
            let ack = build_context(&config)?.publish_once().await?;
            println!("{} {}", ack.status, ack.body);
        }
        Commands::Reconcile => {
            let report = build_context(&config)?.reconcile_once().await?;
            for peer in &report.added {
                println!("added  {peer}");
            }
            for failure in &report.failures {
                println!("failed {} ({})", failure.peer, failure.cause);
            }
            println!(
                "{} added, {} failed",
                report.added_count(),
                report.failures.len()
            );
        }
        Commands::Peers => {
            let peers = build_context(&config)?.registry().fetch_peers().await?;
            for peer in peers {
                println!("{peer}");
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<SyncConfig> {
    let mut config = SyncConfig::load(args.config.as_deref())?;

    // CLI and environment take precedence over the config file
    if let Some(path) = &args.ipc_path {
        config.ipc_path = path.clone();
    }
    if let Some(url) = &args.publish_url {
        config.publish_url = url.clone();
    }
    if let Some(url) = &args.fetch_url {
        config.fetch_url = url.clone();
    }
    if let Some(token) = &args.access_token {
        config.access_token = Credential::new(token.clone());
    }
    if let Some(secs) = args.publish_interval_secs {
        config.publish_interval = std::time::Duration::from_secs(secs);
    }
    if let Some(secs) = args.reconcile_interval_secs {
        config.reconcile_interval = std::time::Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

fn build_context(config: &SyncConfig) -> anyhow::Result<SyncContext> {
    let registry = RegistryClient::new(config.registry_config()?)
        .context("failed to create registry client")?;
    Ok(SyncContext::new(IpcClient::new(config.ipc_config()), registry))
}

async fn run(config: SyncConfig) -> anyhow::Result<()> {
    let ctx = Arc::new(build_context(&config)?);
    info!(
        ipc = %config.ipc_path.display(),
        publish_url = %config.publish_url,
        fetch_url = %config.fetch_url,
        publish_interval = ?config.publish_interval,
        reconcile_interval = ?config.reconcile_interval,
        "starting peer sync"
    );

    let scheduler = spawn_sync_tasks(ctx, config.publish_interval, config.reconcile_interval);
    let monitors = scheduler.monitors().to_vec();
    tokio::select! {
        _ = scheduler.run() => {}
        result = signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("shutdown signal received");
        }
    }
    for monitor in &monitors {
        monitor.report();
    }
    Ok(())
}

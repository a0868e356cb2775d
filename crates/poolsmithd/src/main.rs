//! poolsmithd — the poolsmith daemon.
//!
//! Assembles the provisioner:
//! - State store (redb)
//! - Work queue with per-key backoff
//! - Reconcile workers + periodic resync
//! - REST API
//!
//! # Usage
//!
//! ```text
//! poolsmithd run --port 8080 --data-dir /var/lib/poolsmith --config poolsmith.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use poolsmith_queue::WorkQueue;
use poolsmith_reconcile::Reconciler;
use poolsmith_state::StateStore;
use poolsmithd::{Controller, DaemonConfig, run_resync};

#[derive(Parser)]
#[command(name = "poolsmithd", about = "poolsmith node pool provisioner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller and API server.
    Run {
        /// Path to poolsmith.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/poolsmith")]
        data_dir: PathBuf,

        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Concurrent reconcile workers (overrides the config file).
        #[arg(long)]
        workers: Option<usize>,

        /// Resync interval in seconds (overrides the config file).
        #[arg(long)]
        resync_interval: Option<u64>,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },
    /// Print the effective configuration as TOML.
    PrintConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,poolsmithd=debug,poolsmith=debug"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DaemonConfig> {
    match path {
        Some(path) => DaemonConfig::from_file(path),
        None => Ok(DaemonConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            data_dir,
            port,
            workers,
            resync_interval,
            log_json,
        } => {
            init_tracing(log_json);
            let mut daemon_config = load_config(config.as_ref())?;
            if let Some(workers) = workers {
                daemon_config.controller.workers = workers;
            }
            if let Some(secs) = resync_interval {
                daemon_config.controller.resync_interval_secs = secs;
            }
            run(daemon_config, data_dir, port).await
        }
        Command::PrintConfig { config } => {
            let daemon_config = load_config(config.as_ref())?;
            print!("{}", daemon_config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run(config: DaemonConfig, data_dir: PathBuf, port: u16) -> anyhow::Result<()> {
    info!("poolsmith daemon starting");

    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("poolsmith.redb");

    // ── Initialize subsystems ──────────────────────────────────

    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let queue = WorkQueue::new(config.queue);
    info!(
        base_ms = config.queue.base.as_millis() as u64,
        max_ms = config.queue.max.as_millis() as u64,
        "work queue initialized"
    );

    info!(
        demand_key = %config.provisioner.demand_key,
        match_policy = ?config.provisioner.match_policy,
        "provisioner configured"
    );
    let reconciler = Reconciler::new(store.clone(), config.provisioner.clone());
    let controller = Controller::new(reconciler, queue.clone(), config.controller.workers);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let controller_shutdown = shutdown_rx.clone();
    let resync_shutdown = shutdown_rx;

    // ── Start background tasks ─────────────────────────────────

    let controller_handle = tokio::spawn(async move {
        controller.run(controller_shutdown).await;
    });

    let resync_handle = tokio::spawn(run_resync(
        store.clone(),
        queue.clone(),
        config.controller.resync_interval(),
        resync_shutdown,
    ));

    // ── Start API server ───────────────────────────────────────

    let router = poolsmith_api::build_router(store, queue);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let _ = controller_handle.await;
    let _ = resync_handle.await;

    info!("poolsmith daemon stopped");
    Ok(())
}

//! catalog-worker binary.
//!
//! Reads `catalog.toml` (or the path given with `--config`), opens the
//! configured storage backend(s), and consumes price updates from the broker
//! until SIGINT or SIGTERM.

use std::path::PathBuf;

use anyhow::Context as _;
use catalog_core::{routing::RoutingStore, store::CatalogStore};
use catalog_ingest::{
  amqp::AmqpBroker,
  consumer::Consumer,
  shutdown::{self, Shutdown, ShutdownTrigger},
  supervisor::Supervisor,
};
use catalog_store_eventlog::EventLogStore;
use catalog_store_sqlite::SqliteStore;
use catalog_worker::{StorageMode, WorkerConfig, expand_tilde};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Catalog price ingestion worker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "catalog.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = WorkerConfig::load(&cli.config)
    .context("failed to load worker configuration")?;

  let (trigger, shutdown) = shutdown::channel();
  tokio::spawn(forward_signals(trigger));

  let document_path = expand_tilde(&cfg.storage.document_path);
  let event_log_path = expand_tilde(&cfg.storage.event_log_path);

  info!(mode = ?cfg.storage.mode, "opening storage");
  match cfg.storage.mode {
    StorageMode::Document => {
      let store = SqliteStore::open(&document_path)
        .await
        .with_context(|| format!("failed to open store at {document_path:?}"))?;
      serve(store, &cfg, shutdown).await
    }
    StorageMode::EventLog => {
      let store = EventLogStore::open(&event_log_path)
        .await
        .with_context(|| format!("failed to open log at {event_log_path:?}"))?;
      serve(store, &cfg, shutdown).await
    }
    StorageMode::Mixed => {
      let prices = EventLogStore::open(&event_log_path)
        .await
        .with_context(|| format!("failed to open log at {event_log_path:?}"))?;
      let entities = SqliteStore::open(&document_path)
        .await
        .with_context(|| format!("failed to open store at {document_path:?}"))?;
      serve(RoutingStore::new(prices, entities), &cfg, shutdown).await
    }
  }
}

/// Consume until shutdown, then release the store and the broker.
async fn serve<S: CatalogStore>(
  store: S,
  cfg: &WorkerConfig,
  shutdown: Shutdown,
) -> anyhow::Result<()> {
  store.ping().await.context("storage backend is not reachable")?;

  let broker = AmqpBroker::new(cfg.broker_uri.clone());
  let supervisor = Supervisor::new(Consumer::new(broker, store, cfg.consumer()))
    .with_restart_delay(cfg.restart_delay());

  info!(queue = %cfg.queue, "worker started");
  supervisor.run(shutdown).await;

  let consumer = supervisor.consumer();
  if let Err(e) = consumer.broker().close().await {
    warn!(error = %e, "failed to close broker connection");
  }
  if let Err(e) = consumer.store().disconnect().await {
    warn!(error = %e, "failed to disconnect storage");
  }
  info!("worker stopped");
  Ok(())
}

/// Trigger shutdown on the first SIGINT or SIGTERM.
async fn forward_signals(trigger: ShutdownTrigger) {
  match wait_for_signal().await {
    Ok(()) => info!("shutdown signal received"),
    Err(e) => warn!(error = %e, "failed to listen for signals, shutting down"),
  }
  trigger.trigger();
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
  use tokio::signal::unix::{signal, SignalKind};

  let mut terminate = signal(SignalKind::terminate())?;
  tokio::select! {
    result = tokio::signal::ctrl_c() => result,
    _ = terminate.recv() => Ok(()),
  }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
  tokio::signal::ctrl_c().await
}

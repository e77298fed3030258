//! pulse server binary.
//!
//! Reads `pulse.toml` (or the path given with `--config`) layered under
//! `PULSE_*` environment variables, opens the SQLite store and either serves
//! the HTTP API or repairs drifted engagement counters.
//!
//! ```text
//! pulse --config /etc/pulse.toml serve
//! pulse reconcile
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pulse_core::{
  engine::Engine,
  notify::{ChannelNotifier, LogNotifier, NotificationEvent},
};
use pulse_server::{ServerConfig, expand_tilde, load_config};
use pulse_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::mpsc::UnboundedReceiver};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "pulse feed ranking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pulse.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Default)]
enum Command {
  /// Serve the HTTP API (default).
  #[default]
  Serve,
  /// Recompute like and reply counters from their records and fix drift.
  Reconcile,
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

  let server_cfg = load_config(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or_default() {
    Command::Serve => serve(store, server_cfg).await,
    Command::Reconcile => reconcile(store, server_cfg).await,
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let (notifier, events) = ChannelNotifier::new();
  tokio::spawn(deliver_notifications(events));

  let engine = Engine::new(store, Arc::new(notifier), server_cfg.ranking);
  let app = pulse_server::router(Arc::new(engine));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn reconcile(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let engine = Engine::new(store, Arc::new(LogNotifier), server_cfg.ranking);
  let repaired = engine
    .reconcile_all()
    .await
    .context("counter reconciliation failed")?;
  tracing::info!(repaired, "reconciliation finished");
  println!("{repaired} item(s) repaired");
  Ok(())
}

/// Drain like notifications. Delivery itself (push, email, inbox) sits
/// outside this service; here each event is handed off as a JSON log line.
async fn deliver_notifications(mut events: UnboundedReceiver<NotificationEvent>) {
  while let Some(event) = events.recv().await {
    match serde_json::to_string(&event) {
      Ok(payload) => tracing::info!(%payload, "notification"),
      Err(e) => tracing::warn!(error = %e, "unserialisable notification"),
    }
  }
  tracing::debug!("notification channel closed");
}

//! paddock server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, seeds the habitat grid on first run, starts the
//! feed poller, and serves the read API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use paddock_api::AppState;
use paddock_core::{cache::TtlCache, store::ParkStore as _};
use paddock_feed::{HttpFeedSource, Poller};
use paddock_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Paddock reconciliation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration, deserialised from `config.toml` with
/// `PADDOCK_*` environment overrides.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:       String,
  port:       u16,
  store_path: PathBuf,
  feed_url:   String,
  #[serde(default = "default_park_id")]
  park_id:    i64,
  #[serde(default = "default_poll_interval_secs")]
  poll_interval_secs: u64,
}

fn default_park_id() -> i64 {
  1
}

fn default_poll_interval_secs() -> u64 {
  5
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PADDOCK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  seed_habitats(&store, server_cfg.park_id)
    .await
    .context("failed to seed habitats")?;

  let cache = Arc::new(TtlCache::new());

  // Feed poller runs for the life of the process; cycle failures are
  // logged inside `run` and never tear the server down.
  let poller = Poller::new(
    Arc::clone(&store),
    HttpFeedSource::new(server_cfg.feed_url.clone()),
    Arc::clone(&cache),
  );
  let interval = Duration::from_secs(server_cfg.poll_interval_secs);
  tokio::spawn(async move { poller.run(interval).await });

  let state = AppState { store, cache };
  let app = paddock_api::api_router(state).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create the fixed habitat grid (`A0`..`Z15`) if the store is empty.
/// Idempotent across restarts: an already-seeded store is left untouched.
async fn seed_habitats(store: &SqliteStore, park_id: i64) -> anyhow::Result<()> {
  if !store.list_habitats().await?.is_empty() {
    return Ok(());
  }

  for letter in 'A'..='Z' {
    for number in 0..=15 {
      store.add_habitat(&format!("{letter}{number}"), park_id).await?;
    }
  }
  tracing::info!(park_id, "seeded habitat grid");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

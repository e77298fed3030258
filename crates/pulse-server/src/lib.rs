//! Server assembly for pulse: configuration loading and the traced router.
//!
//! The binary in `main.rs` is a thin shell around these pieces.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use pulse_core::{engine::Engine, feed::RankingConfig, store::EngagementStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `pulse.toml` layered under
/// `PULSE_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub ranking:    RankingConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("pulse.db"),
      ranking:    RankingConfig::default(),
    }
  }
}

/// Read `path` (if it exists) and the environment into a [`ServerConfig`].
///
/// Nested keys use a double underscore in the environment, e.g.
/// `PULSE_RANKING__CANDIDATE_POOL=500`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("PULSE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing applied.
pub fn router<S>(engine: Arc<Engine<S>>) -> Router
where
  S: EngagementStore + 'static,
{
  pulse_api::api_router(engine).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::{path::PathBuf, sync::Arc};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use pulse_core::{engine::Engine, feed::RankingConfig, notify::LogNotifier};
  use pulse_store_sqlite::SqliteStore;
  use tower::ServiceExt;

  use super::*;

  fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("pulse-{name}-{}.toml", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let path = PathBuf::from("/nonexistent/pulse-config.toml");
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.port, ServerConfig::default().port);
    assert_eq!(cfg.ranking, RankingConfig::default());
  }

  #[test]
  fn file_overrides_nested_ranking_fields() {
    let path = temp_config(
      "ranking",
      r#"
        port = 9000
        store_path = "/tmp/pulse-test.db"

        [ranking]
        candidate_pool = 50

        [ranking.weights]
        decay_exponent = 1.8
      "#,
    );
    let cfg = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/pulse-test.db"));
    assert_eq!(cfg.ranking.candidate_pool, 50);
    assert_eq!(cfg.ranking.velocity_window_hours, 3);
    assert_eq!(cfg.ranking.weights.decay_exponent, 1.8);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(&PathBuf::from("~/data/pulse.db"));
    assert_eq!(expanded, PathBuf::from(home).join("data/pulse.db"));
  }

  #[test]
  fn paths_without_tilde_are_untouched() {
    let path = PathBuf::from("/var/lib/pulse.db");
    assert_eq!(expand_tilde(&path), path);
  }

  #[tokio::test]
  async fn traced_router_serves_the_feed() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let engine = Engine::new(store, Arc::new(LogNotifier), RankingConfig::default());
    let req = Request::builder().uri("/feed").body(Body::empty()).unwrap();
    let resp = router(Arc::new(engine)).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}

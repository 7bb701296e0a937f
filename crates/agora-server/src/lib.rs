//! HTTP server for Agora.
//!
//! Mounts the public API from `agora-api` under `/api` and the
//! secret-gated admin/cron trigger surface under `/admin`, and optionally
//! runs the generation cycle on an in-process interval.

pub mod admin;
pub mod auth;
pub mod error;
pub mod schedule;


pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use agora_core::store::ForumStore;
use agora_engine::{Engine, EngineConfig};
use agora_llm::{Completion, LlmConfig};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AGORA_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Argon2 PHC string of the admin secret.
  pub admin_secret_hash:  String,
  #[serde(default)]
  pub llm:                LlmConfig,
  #[serde(default)]
  pub engine:             EngineConfig,
  /// When set, one generation cycle runs per interval.
  #[serde(default)]
  pub cron_interval_secs: Option<u64>,
}

fn default_host() -> String { String::from("127.0.0.1") }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/agora/agora.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the admin handlers.
pub struct AppState<S, C> {
  pub engine: Arc<Engine<S, C>>,
  pub auth:   Arc<AuthConfig>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      auth:   self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: ForumStore + 'static,
  C: Completion + 'static,
{
  let api = agora_api::api_router(state.engine.store().clone());
  Router::new()
    .nest("/api", api)
    .nest("/admin", admin::router(state))
    .layer(TraceLayer::new_for_http())
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

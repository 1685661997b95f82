//! Real-time ingestion server for rtboard.
//!
//! Exposes an axum [`Router`] with a framed WebSocket endpoint for topic rooms
//! and submissions, plus static serving of stored uploads, backed by any
//! [`ObjectStore`].

pub mod error;
pub mod frame;
pub mod hub;
pub mod ingest;
pub mod socket;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use rtboard_core::store::ObjectStore;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use hub::Hub;

/// URL prefix under which stored uploads are served.
pub const UPLOADS_ROUTE: &str = "/static/images/uploads";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RTBOARD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default = "default_uploads_dir")]
  pub uploads_dir:        PathBuf,
  /// Read-modify-write attempts per reply before giving up.
  #[serde(default = "default_max_write_attempts")]
  pub max_write_attempts: u32,
}

fn default_uploads_dir() -> PathBuf { PathBuf::from("static/images/uploads") }

fn default_max_write_attempts() -> u32 { 8 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers and submission tasks.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub hub:    Arc<Hub>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      hub:    Arc::clone(&self.hub),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the board.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ObjectStore + 'static,
{
  let uploads = ServeDir::new(&state.config.uploads_dir);
  Router::new()
    .route("/ws", get(socket::handler::<S>))
    .nest_service(UPLOADS_ROUTE, uploads)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

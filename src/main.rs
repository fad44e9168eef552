//! What's It? · Guess-the-image puzzle backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional Unsplash image search (via environment variables)
//! - Supabase (PostgREST) or in-memory durable store
//!
//! Important env variables:
//!   PORT                      : u16 (default 3000)
//!   UNSPLASH_ACCESS_KEY       : enables puzzle generation if present
//!   UNSPLASH_BASE_URL         : default "https://api.unsplash.com"
//!   SUPABASE_URL              : enables the Supabase store (with the key below)
//!   SUPABASE_SERVICE_ROLE_KEY : service key sent as `apikey` and bearer token
//!   LOCAL_STATE_PATH          : client-local JSON state (default ./data/local_state.json)
//!   PUZZLE_CONFIG_PATH        : path to TOML config (terms, synonyms, hints)
//!   LOG_LEVEL                 : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod seeds;
mod answers;
mod hints;
mod provider;
mod store;
mod generator;
mod session;
mod streak;
mod logic;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (config tables, store, image provider).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "whatsit_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "whatsit_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "whatsit_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "whatsit_backend", "Shutdown signal received");
}

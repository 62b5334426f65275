//! HTTP handlers
//!
//! GET /              - random song page
//! GET /visualization - per-connection SSE level stream
//! GET /health        - liveness and build info

pub mod page;
pub mod viz;

use crate::AppState;
use axum::{extract::State, response::Json};
use serde_json::json;

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "chaser",
        "version": env!("CARGO_PKG_VERSION"),
        "target_artist": state.config.target_artist,
        "cache_entries": state.cache.len(),
    }))
}

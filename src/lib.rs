//! chaser library interface
//!
//! Exposes the router and application state for integration testing.

pub mod affinity;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod video;
pub mod viz;

pub use crate::error::{ApiError, ApiResult, Error, Result};

use crate::affinity::AffinityCache;
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::video::VideoResolver;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
///
/// Everything here is read-only after startup; no state crosses
/// visualization connections.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration
    pub config: Arc<Config>,
    /// Catalog search client
    pub catalog: Arc<CatalogClient>,
    /// Video search resolver
    pub resolver: Arc<VideoResolver>,
    /// Affinity cache, read-only after creation
    pub cache: Arc<AffinityCache>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<CatalogClient>,
        resolver: Arc<VideoResolver>,
        cache: Arc<AffinityCache>,
    ) -> Self {
        Self {
            config,
            catalog,
            resolver,
            cache,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::page::index_page))
        .route("/visualization", get(api::viz::visualization_stream))
        .route("/health", get(api::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

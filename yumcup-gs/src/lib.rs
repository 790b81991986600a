//! yumcup-gs library - bracket game server
//!
//! Seeds single-elimination brackets from nearby venues and serves the
//! start/select protocol over HTTP.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use yumcup_common::config::LegacyConfig;

pub mod api;
pub mod engine;
pub mod error;
pub mod provider;
pub mod seeding;

pub use crate::error::{ApiError, ApiResult};

use crate::engine::GameRegistry;
use crate::provider::CandidateProvider;
use crate::seeding::Seeder;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live games
    pub registry: Arc<GameRegistry>,
    /// Catalog search + bracket creation
    pub seeder: Arc<Seeder>,
    /// Search area for the stateless start endpoint
    pub legacy: LegacyConfig,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn CandidateProvider>,
        registry: Arc<GameRegistry>,
        max_candidates: usize,
        legacy: LegacyConfig,
    ) -> Self {
        let seeder = Arc::new(Seeder::new(provider, registry.clone(), max_candidates));
        Self {
            registry,
            seeder,
            legacy,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::game_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

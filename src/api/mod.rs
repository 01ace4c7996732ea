// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::orchestrator::SeoOrchestrator;
use handlers::{health, runs, teams};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Arc<SeoOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: SeoOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Builds the HTTP router with tracing and permissive CORS
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Descriptors
        .route("/api/teams", get(teams::list_teams))
        .route("/api/teams/:name", get(teams::get_team))
        .route("/api/agents/:name", get(teams::get_agent))
        // Runs
        .route("/api/runs", post(runs::create_run).get(runs::list_runs))
        .route("/api/runs/:id", get(runs::get_run))
        .route("/api/runs/:id/memory/:key", get(runs::get_memory_value))
        .route(
            "/api/runs/:id/agents/:agent/plan-status",
            get(runs::get_plan_status),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}

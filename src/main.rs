use std::sync::Arc;

use seo_agent_hub::api::{self, AppState};
use seo_agent_hub::infrastructure::config::AppConfig;
use seo_agent_hub::infrastructure::repositories::InMemoryRunRepository;
use seo_agent_hub::orchestrator::SeoOrchestrator;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Descriptors, knowledge and tools; any configuration error stops startup
    tracing::info!("Loading agents and teams...");
    let orchestrator = SeoOrchestrator::from_config(
        &config,
        Arc::new(InMemoryRunRepository::with_limit(config.max_runs)),
    )
        .expect("Failed to build agent teams");

    let app = api::router(AppState::new(orchestrator));

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}

//! End-to-end API integration tests
//!
//! These tests verify the complete HTTP API flows including:
//! - Listing the shipped teams and agents
//! - Running the full pipeline against the shipped tool snapshots
//! - Reading shared memory entries and plan status records of a run

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use seo_agent_hub::api::{self, AppState};
use seo_agent_hub::infrastructure::config::AppConfig;
use seo_agent_hub::infrastructure::repositories::InMemoryRunRepository;
use seo_agent_hub::orchestrator::SeoOrchestrator;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

/// Setup test application over the shipped config directory
fn setup_app() -> Router {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");
    let config = AppConfig {
        agents_dir: root.join("agents"),
        teams_dir: root.join("teams"),
        knowledge_path: root.join("knowledge.yaml"),
        snapshot_dir: root.join("snapshots"),
        ..AppConfig::default()
    };
    let orchestrator = SeoOrchestrator::from_config(&config, Arc::new(InMemoryRunRepository::new()))
        .expect("shipped config must load");

    api::router(AppState::new(orchestrator))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn create_run(app: &Router, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/runs")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
}

fn product() -> Value {
    json!({
        "ean": "5701234567890",
        "brand": "Nordic Oak",
        "title": "Nordic Oak Dining Table",
        "category": "dining tables",
        "price": 6999,
        "features": ["oiled finish", "seats eight"]
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_list_and_get_teams() {
    let app = setup_app();

    let (status, teams) = get(&app, "/api/teams").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = teams
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["analysis_team", "data_collection_team"]);

    let (status, team) = get(&app, "/api/teams/data_collection_team").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["memory"], "shared");
    assert_eq!(team["in_pipeline"], true);
    assert_eq!(team["agents"].as_array().unwrap().len(), 6);

    let (status, _) = get(&app, "/api/teams/publishing_team").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_agent_includes_plan() {
    let app = setup_app();

    let (status, agent) = get(&app, "/api/agents/ga_agent").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agent["tools"], json!(["ga_connector"]));
    assert_eq!(agent["model"], "gemini-2.0-flash");
    assert_eq!(agent["plan"].as_array().unwrap().len(), 3);

    let (status, body) = get(&app, "/api/agents/pricing_agent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("pricing_agent"));
}

#[tokio::test]
async fn test_full_product_run() {
    let app = setup_app();

    let (status, summary) = create_run(&app, json!({ "product": product() })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(summary["succeeded"], true);
    assert_eq!(summary["teams"].as_array().unwrap().len(), 2);
    let id = summary["id"].as_str().unwrap().to_string();

    let (status, run) = get(&app, &format!("/api/runs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let seo = &run["context"]["seo_context"];
    assert_eq!(seo["sources_used"].as_array().unwrap().len(), 9);
    assert_eq!(seo["seasonal_trends"]["peak_month"], "November");
    assert_eq!(seo["data_quality_issues"][0]["code"], "missing_gtin");
    assert_eq!(seo["agent_statuses"]["firecrawl_agent"]["status"], "Completed");
    assert!(!seo["high_value_keywords"].as_array().unwrap().is_empty());

    let (status, entry) = get(&app, &format!("/api/runs/{}/memory/semrush_data", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["key"], "semrush_data");
    assert_eq!(entry["value"]["search_volume"], 12100);

    let (status, record) = get(
        &app,
        &format!("/api/runs/{}/agents/content_optimization_agent/plan-status", id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "Completed");
    assert!(record["error_message"].is_null());

    let (status, runs) = get(&app, "/api/runs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(runs[0]["id"], id.as_str());
}

#[tokio::test]
async fn test_unknown_memory_key_is_not_found() {
    let app = setup_app();
    let (_, summary) = create_run(&app, json!({ "product": product() })).await;
    let id = summary["id"].as_str().unwrap();

    let (status, _) = get(&app, &format!("/api/runs/{}/memory/price_intelligence_data", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, &format!("/api/runs/{}/agents/pricing_agent/plan-status", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_run_is_not_found() {
    let app = setup_app();

    let (status, body) = get(&app, &format!("/api/runs/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("Run not found"));
}

#[tokio::test]
async fn test_product_must_be_an_object() {
    let app = setup_app();

    let (status, body) = create_run(&app, json!({ "product": "Nordic Oak Dining Table" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "product must be a JSON object");
}

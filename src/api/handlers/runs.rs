use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agents::errors::AgentError;
use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::domain::plan::PlanStatusRecord;
use crate::domain::run::{RunReport, RunSummary};

/// Request body for starting a product run
#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub product: Value,
}

/// A run together with its unified context
#[derive(Debug, Serialize)]
pub struct RunDetailResponse {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub context: Value,
}

/// One shared-memory entry of a finished run
#[derive(Debug, Serialize)]
pub struct MemoryEntryResponse {
    pub key: String,
    pub value: Value,
}

async fn find_run(state: &AppState, id: Uuid) -> Result<RunReport, ApiError> {
    state
        .orchestrator
        .repository()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AgentError::RunNotFound(id).into())
}

/// Run the pipeline for a product
///
/// POST /api/runs
pub async fn create_run(
    State(state): State<AppState>,
    Json(req): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<RunSummary>), ApiError> {
    if !req.product.is_object() {
        return Err(ApiError::bad_request("product must be a JSON object"));
    }

    let report = state.orchestrator.process_product(req.product).await?;

    Ok((StatusCode::CREATED, Json(report.summary())))
}

/// List runs, most recent first
///
/// GET /api/runs
pub async fn list_runs(State(state): State<AppState>) -> Result<Json<Vec<RunSummary>>, ApiError> {
    let runs = state.orchestrator.repository().list().await?;
    Ok(Json(runs.iter().map(RunReport::summary).collect()))
}

/// Get a run and its unified context
///
/// GET /api/runs/:id
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunDetailResponse>, ApiError> {
    let report = find_run(&state, id).await?;

    Ok(Json(RunDetailResponse {
        summary: report.summary(),
        context: report.context,
    }))
}

/// Read one shared-memory entry of a run
///
/// GET /api/runs/:id/memory/:key
///
/// A key that was never written is 404; a stored null comes back as
/// `"value": null`.
pub async fn get_memory_value(
    State(state): State<AppState>,
    Path((id, key)): Path<(Uuid, String)>,
) -> Result<Json<MemoryEntryResponse>, ApiError> {
    let report = find_run(&state, id).await?;
    let value = report
        .memory_value(&key)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("Key not found: {}", key)))?;

    Ok(Json(MemoryEntryResponse { key, value }))
}

/// Read an agent's validated plan status record
///
/// GET /api/runs/:id/agents/:agent/plan-status
pub async fn get_plan_status(
    State(state): State<AppState>,
    Path((id, agent)): Path<(Uuid, String)>,
) -> Result<Json<PlanStatusRecord>, ApiError> {
    let report = find_run(&state, id).await?;
    let record = report
        .plan_status(&agent)?
        .ok_or_else(|| ApiError::not_found(format!("No plan status for agent: {}", agent)))?;

    Ok(Json(record))
}

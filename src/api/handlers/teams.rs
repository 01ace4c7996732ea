use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::domain::descriptors::{AgentDescriptor, TeamDescriptor};
use crate::domain::memory::MemoryMode;

/// Team as listed by the API
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub name: String,
    pub description: String,
    pub memory: MemoryMode,
    pub agents: Vec<String>,
    pub tools: Vec<String>,
    pub instructions: Option<String>,
    /// Whether the team runs as part of every product run
    pub in_pipeline: bool,
}

impl TeamResponse {
    fn new(team: &TeamDescriptor, in_pipeline: bool) -> Self {
        Self {
            name: team.name().to_string(),
            description: team.description().to_string(),
            memory: team.memory(),
            agents: team.agents().to_vec(),
            tools: team.tools().to_vec(),
            instructions: team.instructions().map(str::to_string),
            in_pipeline,
        }
    }
}

/// Agent as described by the API
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub name: String,
    pub description: String,
    pub model: String,
    pub tools: Vec<String>,
    /// Step plan of the agent's workflow, when it belongs to a pipeline team
    pub plan: Option<Vec<String>>,
}

impl From<&AgentDescriptor> for AgentResponse {
    fn from(agent: &AgentDescriptor) -> Self {
        Self {
            name: agent.name().to_string(),
            description: agent.description().to_string(),
            model: agent.model().to_string(),
            tools: agent.tools().to_vec(),
            plan: None,
        }
    }
}

fn in_pipeline(state: &AppState, team: &str) -> bool {
    state.orchestrator.teams().iter().any(|t| t.name() == team)
}

/// List every loaded team
///
/// GET /api/teams
pub async fn list_teams(State(state): State<AppState>) -> Json<Vec<TeamResponse>> {
    let teams = state
        .orchestrator
        .descriptors()
        .teams()
        .map(|team| TeamResponse::new(team, in_pipeline(&state, team.name())))
        .collect();
    Json(teams)
}

/// Get a team by name
///
/// GET /api/teams/:name
pub async fn get_team(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .orchestrator
        .descriptors()
        .team(&name)
        .ok_or_else(|| ApiError::not_found(format!("Team not found: {}", name)))?;

    Ok(Json(TeamResponse::new(team, in_pipeline(&state, &name))))
}

/// Get an agent by name
///
/// GET /api/agents/:name
pub async fn get_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AgentResponse>, ApiError> {
    let agent = state
        .orchestrator
        .descriptors()
        .agent(&name)
        .ok_or_else(|| ApiError::not_found(format!("Agent not found: {}", name)))?;

    let mut response = AgentResponse::from(agent);
    response.plan = state
        .orchestrator
        .teams()
        .iter()
        .flat_map(|team| team.agents())
        .find(|runnable| runnable.name() == name)
        .map(|runnable| runnable.plan());

    Ok(Json(response))
}

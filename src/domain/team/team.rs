use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::events::TeamEvent;
use super::value_objects::TeamRunStatus;
use crate::agents::errors::AgentResult;
use crate::agents::runner::{Agent, RunSettings};
use crate::agents::types::AgentRunReport;
use crate::agents::WorkflowCatalog;
use crate::domain::descriptors::{DescriptorSet, TeamDescriptor};
use crate::domain::memory::{MemoryMode, SharedMemory};
use crate::tools::ToolRegistry;

/// Outcome of one team run
#[derive(Debug, Clone, Serialize)]
pub struct TeamRunReport {
    pub team: String,
    pub memory: MemoryMode,
    pub status: TeamRunStatus,
    pub agents: Vec<AgentRunReport>,
    pub events: Vec<TeamEvent>,
    /// Private store contents per member, for isolated teams only
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub isolated_snapshots: BTreeMap<String, BTreeMap<String, Value>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TeamRunReport {
    pub fn failed_agents(&self) -> Vec<&str> {
        self.agents
            .iter()
            .filter(|a| !a.succeeded())
            .map(|a| a.agent.as_str())
            .collect()
    }
}

/// Team aggregate root
///
/// A runnable group of agents built from a team descriptor. Every member,
/// its workflow and its tools are resolved at construction, so a team that
/// exists can run; members then execute strictly in order.
///
/// # Invariants
/// - Every member resolves to a loaded agent descriptor with a workflow
/// - Every tool a member or the team lists is registered
/// - A failing member never stops the members after it
///
/// # Example
/// ```
/// use seo_agent_hub::agents::{RunSettings, WorkflowCatalog};
/// use seo_agent_hub::domain::descriptors::{AgentDescriptor, DescriptorSet, TeamDescriptor};
/// use seo_agent_hub::domain::memory::MemoryMode;
/// use seo_agent_hub::domain::team::Team;
/// use seo_agent_hub::tools::ToolRegistry;
///
/// let mut set = DescriptorSet::new();
/// set.add_agent(AgentDescriptor::new("keyword_analysis_agent", vec![]).unwrap()).unwrap();
/// set.add_team(TeamDescriptor::new(
///     "analysis_team",
///     vec!["keyword_analysis_agent".to_string()],
///     MemoryMode::Shared,
/// ).unwrap()).unwrap();
///
/// let team = Team::new(
///     &set,
///     "analysis_team",
///     &WorkflowCatalog::standard(),
///     &ToolRegistry::new(),
///     &RunSettings::default(),
/// ).expect("valid team");
/// assert_eq!(team.agent_names(), vec!["keyword_analysis_agent"]);
/// ```
#[derive(Debug)]
pub struct Team {
    descriptor: TeamDescriptor,
    agents: Vec<Agent>,
}

impl Team {
    /// Builds a runnable team
    ///
    /// # Arguments
    /// * `descriptors` - Loaded agent and team descriptors
    /// * `name` - Team to build
    /// * `catalog` - Workflows bound to agent names
    /// * `registry` - Available tools
    /// * `settings` - Retry, timeout and hierarchy settings for every member
    ///
    /// # Returns
    /// * `Ok(Team)` - Every member resolved
    /// * `Err(AgentError::Configuration)` - Unknown team, unresolved member,
    ///   missing workflow or unknown tool
    ///
    /// # Business Rules Enforced
    /// - Fails before any shared memory store exists
    /// - Team-level tools are granted to every member
    pub fn new(
        descriptors: &DescriptorSet,
        name: &str,
        catalog: &WorkflowCatalog,
        registry: &ToolRegistry,
        settings: &RunSettings,
    ) -> AgentResult<Self> {
        let (descriptor, members) = descriptors.resolve_team(name)?;

        let agents = members
            .into_iter()
            .map(|member| {
                let workflow = catalog.get(member.name())?;
                Agent::new(
                    member.clone(),
                    workflow,
                    registry,
                    descriptor.tools(),
                    settings.clone(),
                )
            })
            .collect::<AgentResult<Vec<_>>>()?;

        tracing::debug!(team = %name, agents = agents.len(), memory = %descriptor.memory(), "Team built");

        Ok(Self {
            descriptor: descriptor.clone(),
            agents,
        })
    }

    /// Runs every member against a store allocated for this run
    ///
    /// Returns the store alongside the report so callers can inspect what
    /// the members wrote.
    pub async fn run(&self) -> (TeamRunReport, SharedMemory) {
        let memory = SharedMemory::new();
        let report = self.run_with_memory(&memory).await;
        (report, memory)
    }

    /// Runs every member in order against `memory`
    ///
    /// # Business Rules
    /// - `shared`: every member reads and writes `memory`
    /// - `isolated`: each member gets a private store seeded with the seed
    ///   entries of `memory`; `memory` itself is left untouched and each
    ///   private store is kept in the report
    pub async fn run_with_memory(&self, memory: &SharedMemory) -> TeamRunReport {
        let started_at = Utc::now();
        let name = self.name().to_string();
        let mode = self.descriptor.memory();
        let mut status = TeamRunStatus::Pending;
        let mut events = Vec::new();
        let mut reports = Vec::with_capacity(self.agents.len());
        let mut isolated_snapshots = BTreeMap::new();

        status = advance(status, TeamRunStatus::Running);
        tracing::info!(team = %name, memory = %mode, agents = self.agents.len(), "Team run started");
        events.push(TeamEvent::Started {
            team: name.clone(),
            memory: mode,
            agents: self.agent_names().into_iter().map(str::to_string).collect(),
            at: started_at,
        });

        for agent in &self.agents {
            let report = match mode {
                MemoryMode::Shared => agent.run(memory).await,
                MemoryMode::Isolated => {
                    let private = SharedMemory::new();
                    for (key, value) in memory.seeds() {
                        private.seed(key, value);
                    }
                    let report = agent.run(&private).await;
                    isolated_snapshots.insert(agent.name().to_string(), private.snapshot());
                    report
                }
            };

            events.push(TeamEvent::AgentFinished {
                team: name.clone(),
                agent: report.agent.clone(),
                succeeded: report.succeeded(),
                at: Utc::now(),
            });
            reports.push(report);
        }

        let failed_agents: Vec<String> = reports
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| r.agent.clone())
            .collect();
        let outcome = if failed_agents.is_empty() {
            TeamRunStatus::Completed
        } else {
            TeamRunStatus::CompletedWithFailures
        };
        status = advance(status, outcome);

        if failed_agents.is_empty() {
            tracing::info!(team = %name, "Team run completed");
        } else {
            tracing::warn!(team = %name, failed = ?failed_agents, "Team run completed with failures");
        }

        let finished_at = Utc::now();
        events.push(TeamEvent::Finished {
            team: name.clone(),
            status,
            failed_agents,
            at: finished_at,
        });

        TeamRunReport {
            team: name,
            memory: mode,
            status,
            agents: reports,
            events,
            isolated_snapshots,
            started_at,
            finished_at,
        }
    }

    // ===== Getters =====

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &TeamDescriptor {
        &self.descriptor
    }

    pub fn memory_mode(&self) -> MemoryMode {
        self.descriptor.memory()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(Agent::name).collect()
    }
}

fn advance(current: TeamRunStatus, next: TeamRunStatus) -> TeamRunStatus {
    debug_assert!(
        current.can_transition_to(next),
        "invalid team transition {} -> {}",
        current,
        next
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::errors::AgentError;
    use crate::domain::descriptors::AgentDescriptor;
    use crate::domain::memory::PRODUCT_DATA_KEY;
    use serde_json::json;

    fn descriptors(memory: MemoryMode) -> DescriptorSet {
        let mut set = DescriptorSet::new();
        set.add_agent(AgentDescriptor::new("keyword_analysis_agent", vec![]).unwrap())
            .unwrap();
        set.add_agent(AgentDescriptor::new("content_optimization_agent", vec![]).unwrap())
            .unwrap();
        set.add_team(
            TeamDescriptor::new(
                "analysis_team",
                vec![
                    "keyword_analysis_agent".to_string(),
                    "content_optimization_agent".to_string(),
                ],
                memory,
            )
            .unwrap(),
        )
        .unwrap();
        set
    }

    fn build(set: &DescriptorSet) -> AgentResult<Team> {
        Team::new(
            set,
            "analysis_team",
            &WorkflowCatalog::standard(),
            &ToolRegistry::new(),
            &RunSettings::default(),
        )
    }

    #[test]
    fn unknown_team_tool_fails_construction() {
        let mut set = DescriptorSet::new();
        set.add_agent(AgentDescriptor::new("keyword_analysis_agent", vec![]).unwrap())
            .unwrap();
        set.add_team(
            TeamDescriptor::from_config(crate::domain::descriptors::TeamConfig {
                name: Some("analysis_team".to_string()),
                agents: vec!["keyword_analysis_agent".to_string()],
                tools: Some(vec!["memory_inspector".to_string()]),
                ..Default::default()
            })
            .unwrap(),
        )
        .unwrap();

        let err = build(&set).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(ref m) if m.contains("memory_inspector")));
    }

    #[test]
    fn agent_without_workflow_fails_construction() {
        let mut set = DescriptorSet::new();
        set.add_agent(AgentDescriptor::new("pricing_agent", vec![]).unwrap())
            .unwrap();
        set.add_team(
            TeamDescriptor::new("analysis_team", vec!["pricing_agent".to_string()], MemoryMode::Shared)
                .unwrap(),
        )
        .unwrap();

        assert!(matches!(build(&set), Err(AgentError::Configuration(_))));
    }

    #[tokio::test]
    async fn failures_do_not_stop_later_members() {
        let team = build(&descriptors(MemoryMode::Shared)).unwrap();
        let (report, memory) = team.run().await;

        // no keyword sources: both analysis agents fail, but both ran
        assert_eq!(report.agents.len(), 2);
        assert_eq!(report.status, TeamRunStatus::CompletedWithFailures);
        assert_eq!(
            report.failed_agents(),
            vec!["keyword_analysis_agent", "content_optimization_agent"]
        );
        assert!(memory.has("content_optimization_agent_plan_status"));
    }

    #[tokio::test]
    async fn shared_team_members_see_each_other() {
        let team = build(&descriptors(MemoryMode::Shared)).unwrap();
        let memory = SharedMemory::new();
        memory.put("trends_data", json!({"related_queries": {"rising": [{"query": "oak table", "value": 40}]}}));

        let report = team.run_with_memory(&memory).await;
        assert_eq!(report.status, TeamRunStatus::Completed);
        assert!(memory.has("keyword_analysis_results"));
        assert!(memory.has("content_optimization_results"));
    }

    #[tokio::test]
    async fn isolated_members_only_see_seeds() {
        let team = build(&descriptors(MemoryMode::Isolated)).unwrap();
        let memory = SharedMemory::new();
        memory.seed(PRODUCT_DATA_KEY, json!({"title": "Oak Table"}));
        memory.put("trends_data", json!({"related_queries": {"rising": [{"query": "oak table", "value": 40}]}}));

        let report = team.run_with_memory(&memory).await;

        // trends_data was not a seed, so the keyword agent never saw it
        assert_eq!(report.failed_agents().len(), 2);
        assert!(!memory.has("keyword_analysis_agent_plan_status"));
        let snapshot = &report.isolated_snapshots["keyword_analysis_agent"];
        assert!(snapshot.contains_key(PRODUCT_DATA_KEY));
        assert!(snapshot.contains_key("keyword_analysis_agent_plan_status"));
        assert!(!snapshot.contains_key("trends_data"));
    }
}

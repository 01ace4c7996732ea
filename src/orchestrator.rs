use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::{InformationHierarchy, RunSettings, WorkflowCatalog};
use crate::context_builder::build_context;
use crate::domain::descriptors::DescriptorSet;
use crate::domain::memory::{SharedMemory, KNOWLEDGE_CONTEXT_KEY, PRODUCT_DATA_KEY};
use crate::domain::repositories::RunRepository;
use crate::domain::run::RunReport;
use crate::domain::team::Team;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::knowledge::load_knowledge;
use crate::infrastructure::manifest_loader::load_descriptors;
use crate::infrastructure::tools::snapshot_registry;
use crate::tools::{RetryPolicy, ToolRegistry};

/// Pause between attempts of a retryable tool call
const TOOL_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Runs the team pipeline for one product at a time
///
/// Every pipeline team is built up front, so a bad descriptor or unknown
/// tool stops the orchestrator from starting rather than failing a run.
/// Each product run gets a fresh store shared by all pipeline teams.
pub struct SeoOrchestrator {
    descriptors: DescriptorSet,
    teams: Vec<Team>,
    knowledge: Value,
    repository: Arc<dyn RunRepository>,
}

impl SeoOrchestrator {
    /// Builds the orchestrator and every pipeline team
    ///
    /// # Returns
    /// * `Err(AgentError::Configuration)` - Empty pipeline, unknown team,
    ///   unresolved member, missing workflow or unknown tool
    pub fn new(
        descriptors: DescriptorSet,
        pipeline: &[String],
        catalog: &WorkflowCatalog,
        tools: &ToolRegistry,
        settings: &RunSettings,
        knowledge: Value,
        repository: Arc<dyn RunRepository>,
    ) -> AgentResult<Self> {
        if pipeline.is_empty() {
            return Err(AgentError::config("Pipeline has no teams"));
        }

        let teams = pipeline
            .iter()
            .map(|name| Team::new(&descriptors, name, catalog, tools, settings))
            .collect::<AgentResult<Vec<_>>>()?;

        tracing::info!(pipeline = ?pipeline, tools = ?tools.names(), "Orchestrator ready");

        Ok(Self {
            descriptors,
            teams,
            knowledge,
            repository,
        })
    }

    /// Loads descriptors, knowledge and snapshot tools as configured
    pub fn from_config(config: &AppConfig, repository: Arc<dyn RunRepository>) -> AgentResult<Self> {
        let descriptors = load_descriptors(&config.agents_dir, &config.teams_dir)?;
        let knowledge = load_knowledge(&config.knowledge_path)?;
        let tools = snapshot_registry(&config.snapshot_dir, &config.credentials);
        let settings = RunSettings {
            retry: RetryPolicy::new(config.tool_max_attempts, TOOL_RETRY_BACKOFF),
            step_timeout: config.step_timeout,
            hierarchy: Arc::new(InformationHierarchy::standard()),
        };
        tracing::info!(
            credentials = config.credentials.len(),
            snapshot_dir = %config.snapshot_dir.display(),
            "Tool configuration loaded"
        );

        Self::new(
            descriptors,
            &config.pipeline,
            &WorkflowCatalog::standard(),
            &tools,
            &settings,
            knowledge,
            repository,
        )
    }

    /// Runs every pipeline team for `product` and records the run
    ///
    /// # Business Rules
    /// - The store is seeded with the product and the knowledge document
    /// - Teams run in pipeline order; a failed agent never stops the run
    /// - The report holds the final store contents and the unified context
    ///
    /// # Returns
    /// * `Err` - Only when the run cannot be saved
    pub async fn process_product(&self, product: Value) -> AgentResult<RunReport> {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(run_id = %id, "Processing product");

        let memory = SharedMemory::new();
        memory.seed(PRODUCT_DATA_KEY, product.clone());
        memory.seed(KNOWLEDGE_CONTEXT_KEY, self.knowledge.clone());

        let mut teams = Vec::with_capacity(self.teams.len());
        for team in &self.teams {
            teams.push(team.run_with_memory(&memory).await);
        }

        let snapshot = memory.snapshot();
        let report = RunReport {
            id,
            started_at,
            finished_at: Utc::now(),
            context: build_context(&product, &snapshot),
            product,
            teams,
            memory: snapshot,
            conflicts: memory.conflicts(),
        };

        self.repository.save(&report).await?;
        tracing::info!(run_id = %id, succeeded = report.succeeded(), "Product run finished");
        Ok(report)
    }

    // ===== Getters =====

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn knowledge(&self) -> &Value {
        &self.knowledge
    }

    pub fn repository(&self) -> &Arc<dyn RunRepository> {
        &self.repository
    }
}

impl std::fmt::Debug for SeoOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeoOrchestrator")
            .field("teams", &self.teams.iter().map(Team::name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::descriptors::{AgentDescriptor, TeamDescriptor};
    use crate::domain::memory::MemoryMode;
    use crate::infrastructure::repositories::InMemoryRunRepository;
    use serde_json::json;

    fn descriptors() -> DescriptorSet {
        let mut set = DescriptorSet::new();
        set.add_agent(AgentDescriptor::new("keyword_analysis_agent", vec![]).unwrap())
            .unwrap();
        set.add_team(
            TeamDescriptor::new(
                "analysis_team",
                vec!["keyword_analysis_agent".to_string()],
                MemoryMode::Shared,
            )
            .unwrap(),
        )
        .unwrap();
        set
    }

    fn orchestrator(pipeline: &[&str]) -> AgentResult<SeoOrchestrator> {
        let pipeline: Vec<String> = pipeline.iter().map(|s| s.to_string()).collect();
        SeoOrchestrator::new(
            descriptors(),
            &pipeline,
            &WorkflowCatalog::standard(),
            &ToolRegistry::new(),
            &RunSettings::default(),
            json!({"general": ["Write for people first"]}),
            Arc::new(InMemoryRunRepository::new()),
        )
    }

    #[test]
    fn unknown_pipeline_team_fails_fast() {
        let err = orchestrator(&["analysis_team", "publishing_team"]).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(ref m) if m.contains("publishing_team")));
    }

    #[tokio::test]
    async fn run_is_seeded_and_saved() {
        let orchestrator = orchestrator(&["analysis_team"]).unwrap();
        let report = orchestrator
            .process_product(json!({"title": "Oak Table"}))
            .await
            .unwrap();

        assert_eq!(report.memory_value(PRODUCT_DATA_KEY), Some(&json!({"title": "Oak Table"})));
        assert!(report.memory_value(KNOWLEDGE_CONTEXT_KEY).is_some());
        // no data was collected, so keyword analysis had nothing to work with
        assert!(!report.succeeded());
        assert_eq!(
            report.context["seo_context"]["agent_statuses"]["keyword_analysis_agent"]["status"],
            "Failed"
        );

        let saved = orchestrator.repository().find_by_id(report.id).await.unwrap();
        assert!(saved.is_some());
    }
}

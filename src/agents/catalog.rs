use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{AgentError, AgentResult};
use super::sources::{
    FIRECRAWL_RESULTS, GA_DATA, MERCHANT_CENTER_DATA, SEARCH_CONSOLE_DATA, SEMRUSH_DATA,
    TRENDS_DATA,
};
use super::workflow::AgentWorkflow;
use super::workflows::{
    CompetitorAnalysisWorkflow, ContentOptimizationWorkflow, DataCollectionWorkflow,
    KeywordAnalysisWorkflow,
};

/// Binds agent names to the workflow that runs them
#[derive(Clone, Default)]
pub struct WorkflowCatalog {
    workflows: HashMap<String, Arc<dyn AgentWorkflow>>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workflows for the nine standard SEO agents
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register("ga_agent", Arc::new(DataCollectionWorkflow::connector(GA_DATA)));
        catalog.register(
            "search_console_agent",
            Arc::new(DataCollectionWorkflow::connector(SEARCH_CONSOLE_DATA)),
        );
        catalog.register(
            "merchant_center_agent",
            Arc::new(DataCollectionWorkflow::connector(MERCHANT_CENTER_DATA)),
        );
        catalog.register("semrush_agent", Arc::new(DataCollectionWorkflow::connector(SEMRUSH_DATA)));
        catalog.register("trends_agent", Arc::new(DataCollectionWorkflow::connector(TRENDS_DATA)));
        catalog.register(
            "firecrawl_agent",
            Arc::new(DataCollectionWorkflow::crawler(FIRECRAWL_RESULTS)),
        );
        catalog.register("keyword_analysis_agent", Arc::new(KeywordAnalysisWorkflow));
        catalog.register("competitor_analysis_agent", Arc::new(CompetitorAnalysisWorkflow));
        catalog.register("content_optimization_agent", Arc::new(ContentOptimizationWorkflow));
        catalog
    }

    /// Binds `agent` to `workflow`, replacing any earlier binding
    pub fn register(&mut self, agent: impl Into<String>, workflow: Arc<dyn AgentWorkflow>) {
        self.workflows.insert(agent.into(), workflow);
    }

    pub fn get(&self, agent: &str) -> AgentResult<Arc<dyn AgentWorkflow>> {
        self.workflows.get(agent).cloned().ok_or_else(|| {
            AgentError::config(format!("No workflow registered for agent '{}'", agent))
        })
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.workflows.contains_key(agent)
    }
}

impl std::fmt::Debug for WorkflowCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut agents: Vec<&String> = self.workflows.keys().collect();
        agents.sort();
        f.debug_struct("WorkflowCatalog").field("agents", &agents).finish()
    }
}

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::{AgentError, AgentResult};
use super::hierarchy::InformationHierarchy;
use crate::domain::descriptors::AgentDescriptor;
use crate::domain::memory::{SharedMemory, KNOWLEDGE_CONTEXT_KEY, PRODUCT_DATA_KEY};
use crate::tools::{DataSourceRequest, RetryPolicy, ScrapeRequest, ToolHandle};

/// Tool capability a workflow cannot run without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRequirement {
    DataSource,
    Scraper,
}

impl ToolRequirement {
    pub fn satisfied_by(&self, handle: &ToolHandle) -> bool {
        matches!(
            (self, handle),
            (ToolRequirement::DataSource, ToolHandle::DataSource(_))
                | (ToolRequirement::Scraper, ToolHandle::Scraper(_))
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            ToolRequirement::DataSource => "data_source",
            ToolRequirement::Scraper => "web_scraper",
        }
    }
}

/// The behavior behind an agent: its plan and what each step does
///
/// Steps run strictly in order. A step reads shared memory through the
/// [`StepContext`], may call the agent's tools, and hands intermediate data
/// to later steps through the context stash. Only the final results are
/// published, by the runner, once every step has succeeded.
#[async_trait]
pub trait AgentWorkflow: Send + Sync {
    /// Ordered, human-readable step descriptions
    fn plan(&self, agent: &AgentDescriptor) -> Vec<String>;

    /// Shared-memory key the results are published under
    fn results_key(&self) -> &str;

    fn required_tool(&self) -> Option<ToolRequirement> {
        None
    }

    /// Executes step `index` of the plan
    async fn run_step(&self, index: usize, ctx: &mut StepContext) -> AgentResult<()>;
}

/// Everything a step may touch while it runs
pub struct StepContext {
    agent: String,
    step: usize,
    memory: SharedMemory,
    tools: Vec<(String, ToolHandle)>,
    retry: RetryPolicy,
    hierarchy: Arc<InformationHierarchy>,
    stash: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    data_gaps: Vec<String>,
    results: Option<Value>,
}

impl StepContext {
    pub fn new(
        agent: impl Into<String>,
        memory: SharedMemory,
        tools: Vec<(String, ToolHandle)>,
        retry: RetryPolicy,
        hierarchy: Arc<InformationHierarchy>,
    ) -> Self {
        Self {
            agent: agent.into(),
            step: 0,
            memory,
            tools,
            retry,
            hierarchy,
            stash: HashMap::new(),
            data_gaps: Vec::new(),
            results: None,
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent
    }

    /// Index of the step currently executing
    pub fn step(&self) -> usize {
        self.step
    }

    pub(crate) fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    pub fn hierarchy(&self) -> &InformationHierarchy {
        &self.hierarchy
    }

    /// Builds a step failure for the current step
    pub fn fail(&self, reason: impl Into<String>) -> AgentError {
        AgentError::StepExecution {
            step: self.step,
            reason: reason.into(),
        }
    }

    // ===== Shared memory reads =====

    /// Reads a key the step cannot do without
    ///
    /// # Returns
    /// * `Err(AgentError::PrerequisiteMissing)` - If the key was never written
    pub fn require(&self, key: &str) -> AgentResult<Value> {
        self.memory
            .get(key)
            .ok_or_else(|| AgentError::PrerequisiteMissing {
                agent: self.agent.clone(),
                key: key.to_string(),
            })
    }

    /// Reads and decodes a key the step cannot do without
    pub fn require_as<T: DeserializeOwned>(&self, key: &str) -> AgentResult<T> {
        let value = self.require(key)?;
        serde_json::from_value(value)
            .map_err(|e| self.fail(format!("'{}' is malformed: {}", key, e)))
    }

    /// Reads a key that may be missing; a missing key is noted as a data gap
    pub fn optional(&mut self, key: &str) -> Option<Value> {
        let value = self.memory.get(key).filter(|v| !v.is_null());
        if value.is_none() {
            self.note_gap(key);
        }
        value
    }

    /// Reads and decodes a key that may be missing
    ///
    /// A value that does not decode is treated as unavailable.
    pub fn optional_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.optional(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(agent = %self.agent, key, error = %e, "Ignoring malformed source data");
                self.note_gap(format!("{} (malformed)", key));
                None
            }
        }
    }

    /// Product data seeded for this run, or `Null` when none was given
    pub fn product(&self) -> Value {
        self.memory.get(PRODUCT_DATA_KEY).unwrap_or(Value::Null)
    }

    /// Decodes one section of the seeded knowledge document
    ///
    /// Falls back to `T::default()` when the section is absent or malformed.
    /// A missing knowledge document is not a data gap.
    pub fn knowledge_section<T: DeserializeOwned + Default>(&self, section: &str) -> T {
        let Some(value) = self
            .memory
            .get(KNOWLEDGE_CONTEXT_KEY)
            .and_then(|doc| doc.get(section).cloned())
        else {
            return T::default();
        };
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(agent = %self.agent, section, error = %e, "Ignoring malformed knowledge section");
            T::default()
        })
    }

    pub fn note_gap(&mut self, gap: impl Into<String>) {
        let gap = gap.into();
        if !self.data_gaps.contains(&gap) {
            self.data_gaps.push(gap);
        }
    }

    pub fn data_gaps(&self) -> &[String] {
        &self.data_gaps
    }

    // ===== Tools =====

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Calls the agent's first data-source tool under the retry policy
    pub async fn fetch(&self, request: &DataSourceRequest) -> AgentResult<Value> {
        let (name, connector) = self
            .tools
            .iter()
            .find_map(|(name, handle)| match handle {
                ToolHandle::DataSource(connector) => Some((name, connector)),
                ToolHandle::Scraper(_) => None,
            })
            .ok_or_else(|| self.fail("agent has no data source tool"))?;

        tracing::debug!(agent = %self.agent, tool = %name, "Calling data source");
        let value = self.retry.run(|| connector.fetch(request)).await?;
        Ok(value)
    }

    /// Calls the agent's first scraper tool under the retry policy
    pub async fn scrape(&self, request: &ScrapeRequest) -> AgentResult<Value> {
        let (name, scraper) = self
            .tools
            .iter()
            .find_map(|(name, handle)| match handle {
                ToolHandle::Scraper(scraper) => Some((name, scraper)),
                ToolHandle::DataSource(_) => None,
            })
            .ok_or_else(|| self.fail("agent has no scraper tool"))?;

        tracing::debug!(agent = %self.agent, tool = %name, action = %request.action, "Calling scraper");
        let value = self.retry.run(|| scraper.scrape(request)).await?;
        Ok(value)
    }

    // ===== Step-to-step data =====

    pub fn stash<T: Any + Send + Sync>(&mut self, key: &'static str, value: T) {
        self.stash.insert(key, Box::new(value));
    }

    /// Removes a value stashed by an earlier step
    pub fn take<T: Any + Send + Sync>(&mut self, key: &'static str) -> AgentResult<T> {
        let boxed = self
            .stash
            .remove(key)
            .ok_or_else(|| self.fail(format!("no '{}' from an earlier step", key)))?;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| self.fail(format!("'{}' has an unexpected type", key)))
    }

    // ===== Results =====

    /// Sets the value the runner publishes once every step has succeeded
    pub fn set_results(&mut self, value: Value) {
        self.results = Some(value);
    }

    pub fn set_results_from<T: Serialize>(&mut self, results: &T) -> AgentResult<()> {
        self.results = Some(serde_json::to_value(results)?);
        Ok(())
    }

    pub(crate) fn take_results(&mut self) -> Option<Value> {
        self.results.take()
    }
}

impl std::fmt::Debug for StepContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("agent", &self.agent)
            .field("step", &self.step)
            .field("tools", &self.tool_names())
            .field("data_gaps", &self.data_gaps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{DataSourceConnector, ToolFault};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl DataSourceConnector for FlakySource {
        fn source_name(&self) -> &str {
            "flaky"
        }

        async fn fetch(&self, _request: &DataSourceRequest) -> Result<Value, ToolFault> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ToolFault::transient("flaky", "rate limited"))
            } else {
                Ok(json!({"ok": true}))
            }
        }
    }

    fn context(memory: SharedMemory, tools: Vec<(String, ToolHandle)>, retry: RetryPolicy) -> StepContext {
        StepContext::new(
            "keyword_analysis_agent",
            memory,
            tools,
            retry,
            Arc::new(InformationHierarchy::standard()),
        )
    }

    #[test]
    fn require_missing_key_is_prerequisite_error() {
        let ctx = context(SharedMemory::new(), vec![], RetryPolicy::default());
        let err = ctx.require("ga_data").unwrap_err();
        assert!(matches!(
            err,
            AgentError::PrerequisiteMissing { ref key, .. } if key == "ga_data"
        ));
    }

    #[test]
    fn optional_records_gap_once() {
        let mut ctx = context(SharedMemory::new(), vec![], RetryPolicy::default());
        assert!(ctx.optional("semrush_data").is_none());
        assert!(ctx.optional("semrush_data").is_none());
        assert_eq!(ctx.data_gaps(), ["semrush_data".to_string()]);
    }

    #[test]
    fn malformed_optional_value_is_a_gap() {
        let memory = SharedMemory::new();
        memory.put("trends_data", json!("not an object"));
        let mut ctx = context(memory, vec![], RetryPolicy::default());

        let decoded: Option<crate::agents::sources::TrendsData> = ctx.optional_as("trends_data");
        assert!(decoded.is_none());
        assert_eq!(ctx.data_gaps(), ["trends_data (malformed)".to_string()]);
    }

    #[test]
    fn stash_round_trips_typed_values() {
        let mut ctx = context(SharedMemory::new(), vec![], RetryPolicy::default());
        ctx.stash("terms", vec!["oak".to_string()]);

        let terms: Vec<String> = ctx.take("terms").unwrap();
        assert_eq!(terms, vec!["oak".to_string()]);
        assert!(ctx.take::<Vec<String>>("terms").is_err());
    }

    #[test]
    fn stash_type_mismatch_fails_step() {
        let mut ctx = context(SharedMemory::new(), vec![], RetryPolicy::default());
        ctx.set_step(2);
        ctx.stash("count", 3_usize);

        let err = ctx.take::<String>("count").unwrap_err();
        assert!(matches!(err, AgentError::StepExecution { step: 2, .. }));
    }

    #[tokio::test]
    async fn fetch_retries_transient_faults() {
        let source = Arc::new(FlakySource {
            calls: AtomicU32::new(0),
        });
        let ctx = context(
            SharedMemory::new(),
            vec![("ga_connector".to_string(), ToolHandle::DataSource(source.clone()))],
            RetryPolicy::new(2, std::time::Duration::ZERO),
        );

        let value = ctx.fetch(&DataSourceRequest::default()).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_without_data_source_fails_step() {
        let ctx = context(SharedMemory::new(), vec![], RetryPolicy::default());
        let err = ctx.fetch(&DataSourceRequest::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::StepExecution { .. }));
    }
}

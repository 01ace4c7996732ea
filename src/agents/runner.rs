use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::errors::{AgentError, AgentResult};
use super::hierarchy::InformationHierarchy;
use super::types::{AgentRunReport, RunOutcome};
use super::workflow::{AgentWorkflow, StepContext};
use crate::domain::descriptors::AgentDescriptor;
use crate::domain::memory::{plan_status_key, SharedMemory, KNOWLEDGE_CONTEXT_KEY, PRODUCT_DATA_KEY};
use crate::domain::plan::{PlanEvent, PlanStatus, PlanStatusRecord};
use crate::tools::{RetryPolicy, ToolHandle, ToolRegistry};

/// Execution settings shared by every agent in a run
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub retry: RetryPolicy,
    /// Upper bound on a single step; `None` waits indefinitely
    pub step_timeout: Option<Duration>,
    pub hierarchy: Arc<InformationHierarchy>,
}

/// A runnable agent: descriptor, workflow and resolved tools
pub struct Agent {
    descriptor: AgentDescriptor,
    workflow: Arc<dyn AgentWorkflow>,
    tools: Vec<(String, ToolHandle)>,
    settings: RunSettings,
}

impl Agent {
    /// Resolves the agent's tools and checks its workflow can run
    ///
    /// # Arguments
    /// * `descriptor` - Loaded agent descriptor
    /// * `workflow` - Behavior bound to the agent's name
    /// * `registry` - Available tools
    /// * `shared_tools` - Tools granted by the owning team, appended after the agent's own
    ///
    /// # Returns
    /// * `Err(AgentError::Configuration)` - Unknown tool, missing required tool,
    ///   or a results key that collides with a reserved key
    pub fn new(
        descriptor: AgentDescriptor,
        workflow: Arc<dyn AgentWorkflow>,
        registry: &ToolRegistry,
        shared_tools: &[String],
        settings: RunSettings,
    ) -> AgentResult<Self> {
        let mut tools = Vec::new();
        for name in descriptor.tools().iter().chain(shared_tools) {
            if tools.iter().any(|(existing, _)| existing == name) {
                continue;
            }
            let handle = registry.resolve(name).map_err(|_| {
                AgentError::config(format!(
                    "Agent '{}' references unknown tool '{}'",
                    descriptor.name(),
                    name
                ))
            })?;
            tools.push((name.clone(), handle));
        }

        if let Some(requirement) = workflow.required_tool() {
            if !tools.iter().any(|(_, handle)| requirement.satisfied_by(handle)) {
                return Err(AgentError::config(format!(
                    "Agent '{}' needs a {} tool",
                    descriptor.name(),
                    requirement.category()
                )));
            }
        }

        let results_key = workflow.results_key();
        if results_key.is_empty()
            || results_key == PRODUCT_DATA_KEY
            || results_key == KNOWLEDGE_CONTEXT_KEY
            || results_key.ends_with("_plan_status")
        {
            return Err(AgentError::config(format!(
                "Agent '{}' cannot publish results under reserved key '{}'",
                descriptor.name(),
                results_key
            )));
        }

        Ok(Self {
            descriptor,
            workflow,
            tools,
            settings,
        })
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    pub fn results_key(&self) -> &str {
        self.workflow.results_key()
    }

    pub fn plan(&self) -> Vec<String> {
        self.workflow.plan(&self.descriptor)
    }

    /// Runs the agent's plan against `memory`
    ///
    /// # Business Rules
    /// - The plan status record is written before the first step and after
    ///   every transition
    /// - On failure the record ends Failed and no results are published
    /// - Results are published before the record is marked Completed
    /// - Dropping the returned future mid-run leaves the record Failed
    pub async fn run(&self, memory: &SharedMemory) -> AgentRunReport {
        let started_at = Utc::now();
        let name = self.name().to_string();
        tracing::info!(agent = %name, "Agent run started");

        let mut ctx = StepContext::new(
            name.clone(),
            memory.clone(),
            self.tools.clone(),
            self.settings.retry,
            self.settings.hierarchy.clone(),
        );

        let mut tracker = match PlanTracker::start(&name, memory, self.plan()) {
            Ok(tracker) => tracker,
            Err(e) => {
                tracing::error!(agent = %name, error = %e, "Agent declared an invalid plan");
                return AgentRunReport {
                    agent: name,
                    outcome: RunOutcome::Failed {
                        step: -1,
                        reason: e.to_string(),
                    },
                    results_key: None,
                    data_gaps: Vec::new(),
                    events: Vec::new(),
                    started_at,
                    finished_at: Utc::now(),
                };
            }
        };

        let outcome = match self.execute(&mut ctx, &mut tracker, memory).await {
            Ok(()) => {
                tracing::info!(agent = %name, results_key = self.results_key(), "Agent run completed");
                RunOutcome::Completed
            }
            Err(e) => {
                let reason = e.to_string();
                tracker.fail(&reason);
                tracing::warn!(agent = %name, step = tracker.step(), error = %reason, "Agent run failed");
                RunOutcome::Failed {
                    step: tracker.step(),
                    reason,
                }
            }
        };

        let results_key = match outcome {
            RunOutcome::Completed => Some(self.results_key().to_string()),
            RunOutcome::Failed { .. } => None,
        };

        AgentRunReport {
            agent: name,
            outcome,
            results_key,
            data_gaps: ctx.data_gaps().to_vec(),
            events: tracker.finish(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn execute(
        &self,
        ctx: &mut StepContext,
        tracker: &mut PlanTracker,
        memory: &SharedMemory,
    ) -> AgentResult<()> {
        for index in 0..tracker.len() {
            tracker.begin(index)?;
            ctx.set_step(index);

            let step = self.workflow.run_step(index, ctx);
            match self.settings.step_timeout {
                Some(limit) => tokio::time::timeout(limit, step).await.map_err(|_| {
                    AgentError::StepExecution {
                        step: index,
                        reason: format!("timed out after {}s", limit.as_secs_f64()),
                    }
                })??,
                None => step.await?,
            }
        }

        let results = ctx
            .take_results()
            .ok_or_else(|| ctx.fail("workflow finished without results"))?;
        let key = self.results_key();
        if memory.is_seeded(key) {
            return Err(AgentError::config(format!(
                "Agent '{}' cannot overwrite seeded key '{}'",
                self.name(),
                key
            )));
        }
        memory.put_as(self.name(), key, results);
        tracker.complete()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name())
            .field("results_key", &self.results_key())
            .field("tools", &self.tools)
            .finish()
    }
}

/// Keeps an agent's plan status record in shared memory in step with its run
///
/// If dropped while the record is still in progress (the run was cancelled),
/// the record is written back as Failed.
struct PlanTracker {
    agent: String,
    key: String,
    memory: SharedMemory,
    record: PlanStatusRecord,
    events: Vec<PlanEvent>,
}

impl PlanTracker {
    fn start(agent: &str, memory: &SharedMemory, plan: Vec<String>) -> AgentResult<Self> {
        let (record, created) = PlanStatusRecord::new(plan)?;
        let mut tracker = Self {
            agent: agent.to_string(),
            key: plan_status_key(agent),
            memory: memory.clone(),
            record,
            events: Vec::new(),
        };
        tracker.write();
        tracker.record_event(created);
        Ok(tracker)
    }

    fn len(&self) -> usize {
        self.record.plan().len()
    }

    fn step(&self) -> i64 {
        self.record.current_step_index()
    }

    fn begin(&mut self, index: usize) -> AgentResult<()> {
        let event = self.record.begin_step(index)?;
        self.write();
        self.record_event(event);
        Ok(())
    }

    fn complete(&mut self) -> AgentResult<()> {
        let event = self.record.complete()?;
        self.write();
        self.record_event(event);
        Ok(())
    }

    fn fail(&mut self, reason: &str) {
        if self.record.is_terminal() {
            return;
        }
        match self.record.fail(reason) {
            Ok(event) => {
                self.write();
                self.record_event(event);
            }
            Err(e) => {
                tracing::error!(agent = %self.agent, error = %e, "Could not mark plan failed");
            }
        }
    }

    fn finish(mut self) -> Vec<PlanEvent> {
        std::mem::take(&mut self.events)
    }

    fn write(&self) {
        self.memory
            .put_as(&self.agent, self.key.clone(), self.record.to_value());
    }

    fn record_event(&mut self, event: PlanEvent) {
        tracing::debug!(agent = %self.agent, ?event, "Plan status changed");
        self.events.push(event);
    }
}

impl Drop for PlanTracker {
    fn drop(&mut self) {
        if self.record.status() == PlanStatus::InProgress {
            tracing::warn!(agent = %self.agent, step = self.step(), "Agent run cancelled");
            self.fail("agent run cancelled");
        }
    }
}

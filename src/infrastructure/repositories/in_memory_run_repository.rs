use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::agents::errors::AgentResult;
use crate::domain::repositories::RunRepository;
use crate::domain::run::RunReport;
use crate::infrastructure::config::DEFAULT_MAX_RUNS;

/// Process-local implementation of RunRepository
///
/// Keeps at most `max_runs` reports; saving past the limit evicts the run
/// that started first. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct InMemoryRunRepository {
    runs: Arc<RwLock<HashMap<Uuid, RunReport>>>,
    max_runs: usize,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_RUNS)
    }

    /// Repository retaining at most `max_runs` runs (at least one)
    pub fn with_limit(max_runs: usize) -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            max_runs: max_runs.max(1),
        }
    }

    pub fn max_runs(&self) -> usize {
        self.max_runs
    }
}

impl Default for InMemoryRunRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn save(&self, report: &RunReport) -> AgentResult<()> {
        let mut runs = self.runs.write();
        runs.insert(report.id, report.clone());

        while runs.len() > self.max_runs {
            let Some(oldest) = runs
                .values()
                .min_by_key(|run| run.started_at)
                .map(|run| run.id)
            else {
                break;
            };
            runs.remove(&oldest);
            tracing::debug!(run_id = %oldest, "Evicted oldest run");
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AgentResult<Option<RunReport>> {
        Ok(self.runs.read().get(&id).cloned())
    }

    async fn list(&self) -> AgentResult<Vec<RunReport>> {
        let mut runs: Vec<RunReport> = self.runs.read().values().cloned().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::agents::errors::AgentResult;
use crate::domain::run::RunReport;

/// Repository trait for product run reports
///
/// Defines the contract for keeping finished runs so observers can read
/// their results and plan status records afterwards.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Save a run report (insert or replace)
    async fn save(&self, report: &RunReport) -> AgentResult<()>;

    /// Find a run by its ID
    async fn find_by_id(&self, id: Uuid) -> AgentResult<Option<RunReport>>;

    /// All runs, most recent first
    async fn list(&self) -> AgentResult<Vec<RunReport>>;
}

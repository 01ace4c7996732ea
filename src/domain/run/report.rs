use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::agents::errors::AgentResult;
use crate::domain::memory::{plan_status_key, WriteConflict};
use crate::domain::plan::PlanStatusRecord;
use crate::domain::team::{TeamRunReport, TeamRunStatus};

/// Everything one product run produced
///
/// Holds the final contents of the run's shared memory store, so observers
/// can read results and plan status records after the run is over.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub product: Value,
    pub teams: Vec<TeamRunReport>,
    pub context: Value,
    pub memory: BTreeMap<String, Value>,
    pub conflicts: Vec<WriteConflict>,
}

impl RunReport {
    /// Value stored under `key` when the run ended, `None` if never written
    pub fn memory_value(&self, key: &str) -> Option<&Value> {
        self.memory.get(key)
    }

    /// Validated plan status record of `agent`, `None` if it never ran
    pub fn plan_status(&self, agent: &str) -> AgentResult<Option<PlanStatusRecord>> {
        self.memory
            .get(&plan_status_key(agent))
            .cloned()
            .map(PlanStatusRecord::from_value)
            .transpose()
    }

    /// Whether every agent of every team completed
    pub fn succeeded(&self) -> bool {
        self.teams
            .iter()
            .all(|team| team.status == TeamRunStatus::Completed)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            succeeded: self.succeeded(),
            teams: self
                .teams
                .iter()
                .map(|team| TeamSummary {
                    team: team.team.clone(),
                    status: team.status,
                    failed_agents: team
                        .failed_agents()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                })
                .collect(),
            keys: self.memory.keys().cloned().collect(),
        }
    }
}

/// Compact view of a run for listings and API responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: bool,
    pub teams: Vec<TeamSummary>,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub team: String,
    pub status: TeamRunStatus,
    pub failed_agents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(memory: BTreeMap<String, Value>) -> RunReport {
        let now = Utc::now();
        RunReport {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            product: json!({"title": "Oak Table"}),
            teams: vec![],
            context: Value::Null,
            memory,
            conflicts: vec![],
        }
    }

    #[test]
    fn stored_null_differs_from_missing() {
        let mut memory = BTreeMap::new();
        memory.insert("semrush_data".to_string(), Value::Null);
        let report = report(memory);

        assert_eq!(report.memory_value("semrush_data"), Some(&Value::Null));
        assert_eq!(report.memory_value("ga_data"), None);
    }

    #[test]
    fn plan_status_is_validated() {
        let mut memory = BTreeMap::new();
        memory.insert(
            "ga_agent_plan_status".to_string(),
            json!({"plan": [], "current_step_index": -1, "status": "NotStarted",
                   "last_update": "2026-01-01T00:00:00Z", "error_message": null}),
        );
        let report = report(memory);

        assert!(report.plan_status("ga_agent").is_err());
        assert!(report.plan_status("trends_agent").unwrap().is_none());
    }

    #[test]
    fn summary_lists_keys_in_order() {
        let mut memory = BTreeMap::new();
        memory.insert("trends_data".to_string(), json!({}));
        memory.insert("ga_data".to_string(), json!({}));
        let summary = report(memory).summary();

        assert!(summary.succeeded);
        assert_eq!(summary.keys, vec!["ga_data", "trends_data"]);
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::value_objects::TeamRunStatus;
use crate::domain::memory::MemoryMode;

/// Domain events that occur during a team run
///
/// Collected into the team run report and logged as they happen.
///
/// # Example
/// ```
/// use seo_agent_hub::domain::team::events::TeamEvent;
///
/// let event = TeamEvent::AgentFinished {
///     team: "data_collection_team".to_string(),
///     agent: "ga_agent".to_string(),
///     succeeded: true,
///     at: chrono::Utc::now(),
/// };
/// assert_eq!(event.team(), "data_collection_team");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TeamEvent {
    /// Fired when the first member is about to run
    Started {
        team: String,
        memory: MemoryMode,
        agents: Vec<String>,
        at: DateTime<Utc>,
    },
    /// Fired after each member run, successful or not
    AgentFinished {
        team: String,
        agent: String,
        succeeded: bool,
        at: DateTime<Utc>,
    },
    /// Fired once every member has run
    Finished {
        team: String,
        status: TeamRunStatus,
        failed_agents: Vec<String>,
        at: DateTime<Utc>,
    },
}

impl TeamEvent {
    /// Returns the team name for this event
    pub fn team(&self) -> &str {
        match self {
            TeamEvent::Started { team, .. } => team,
            TeamEvent::AgentFinished { team, .. } => team,
            TeamEvent::Finished { team, .. } => team,
        }
    }
}

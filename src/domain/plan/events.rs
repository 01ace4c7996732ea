use chrono::{DateTime, Utc};
use serde::Serialize;

/// Events produced by a plan status record as it moves through its lifecycle
///
/// The agent runner collects them into the run report and logs each one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlanEvent {
    /// Fired when the plan is written with status NotStarted
    Created {
        /// Number of steps in the plan
        steps: usize,
        at: DateTime<Utc>,
    },
    /// Fired immediately before a step executes
    StepStarted {
        index: usize,
        description: String,
        at: DateTime<Utc>,
    },
    /// Fired after the last step succeeded
    Completed { at: DateTime<Utc> },
    /// Fired when a step could not complete
    Failed {
        /// Step that was executing, -1 if none had started
        step: i64,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl PlanEvent {
    /// Returns when this event happened
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            PlanEvent::Created { at, .. } => *at,
            PlanEvent::StepStarted { at, .. } => *at,
            PlanEvent::Completed { at } => *at,
            PlanEvent::Failed { at, .. } => *at,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanEvent::Completed { .. } | PlanEvent::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_event_is_terminal() {
        let event = PlanEvent::Failed {
            step: 1,
            reason: "quota exhausted".to_string(),
            at: Utc::now(),
        };
        assert!(event.is_terminal());
    }

    #[test]
    fn step_started_serializes_with_tag() {
        let at = Utc::now();
        let event = PlanEvent::StepStarted {
            index: 0,
            description: "Fetch".to_string(),
            at,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "step_started");
        assert_eq!(event.at(), at);
        assert!(!event.is_terminal());
    }
}

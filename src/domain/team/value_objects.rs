use serde::{Deserialize, Serialize};

/// Lifecycle status of one team run
///
/// # Status Transitions
/// ```text
/// Pending -> Running -> Completed
///            \---> CompletedWithFailures
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRunStatus {
    /// Team built, no agent started yet
    Pending,
    /// Members are executing
    Running,
    /// Every member completed
    Completed,
    /// Every member ran, at least one failed
    CompletedWithFailures,
}

impl TeamRunStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use seo_agent_hub::domain::team::value_objects::TeamRunStatus;
    ///
    /// assert!(TeamRunStatus::Pending.can_transition_to(TeamRunStatus::Running));
    /// assert!(!TeamRunStatus::Pending.can_transition_to(TeamRunStatus::Completed));
    /// ```
    pub fn can_transition_to(&self, next: TeamRunStatus) -> bool {
        use TeamRunStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Running, Completed) | (Running, CompletedWithFailures)
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TeamRunStatus::Completed | TeamRunStatus::CompletedWithFailures
        )
    }
}

impl std::fmt::Display for TeamRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRunStatus::Pending => write!(f, "pending"),
            TeamRunStatus::Running => write!(f, "running"),
            TeamRunStatus::Completed => write!(f, "completed"),
            TeamRunStatus::CompletedWithFailures => write!(f, "completed_with_failures"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_pending_to_running() {
        assert!(TeamRunStatus::Pending.can_transition_to(TeamRunStatus::Running));
    }

    #[test]
    fn running_can_finish_either_way() {
        assert!(TeamRunStatus::Running.can_transition_to(TeamRunStatus::Completed));
        assert!(TeamRunStatus::Running.can_transition_to(TeamRunStatus::CompletedWithFailures));
    }

    #[test]
    fn finished_runs_are_final() {
        assert!(!TeamRunStatus::Completed.can_transition_to(TeamRunStatus::Running));
        assert!(!TeamRunStatus::CompletedWithFailures.can_transition_to(TeamRunStatus::Completed));
        assert!(TeamRunStatus::Completed.is_finished());
        assert!(!TeamRunStatus::Running.is_finished());
    }

    #[test]
    fn status_display() {
        assert_eq!(TeamRunStatus::CompletedWithFailures.to_string(), "completed_with_failures");
        assert_eq!(TeamRunStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TeamRunStatus::CompletedWithFailures).unwrap(),
            "\"completed_with_failures\""
        );
    }
}

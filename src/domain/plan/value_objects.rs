use serde::{Deserialize, Serialize};

/// Progress status of an agent's plan
///
/// # Status Transitions
/// ```text
/// NotStarted -> InProgress -> Completed
///                   |  ^
///                   +--+ (next step)
///                   +----> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    /// Plan written, no step started yet
    NotStarted,
    /// A step is executing
    InProgress,
    /// Last step succeeded
    Completed,
    /// A step could not complete
    Failed,
}

impl PlanStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - NotStarted -> InProgress
    /// - InProgress -> InProgress (moving to the next step)
    /// - InProgress -> Completed
    /// - InProgress -> Failed
    ///
    /// # Example
    /// ```
    /// use seo_agent_hub::domain::plan::PlanStatus;
    ///
    /// assert!(PlanStatus::NotStarted.can_transition_to(PlanStatus::InProgress));
    /// assert!(!PlanStatus::NotStarted.can_transition_to(PlanStatus::Completed));
    /// ```
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        use PlanStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, InProgress)
                | (InProgress, Completed)
                | (InProgress, Failed)
        )
    }

    /// Completed and Failed records are not mutated again within a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Failed)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanStatus::NotStarted => write!(f, "NotStarted"),
            PlanStatus::InProgress => write!(f, "InProgress"),
            PlanStatus::Completed => write!(f, "Completed"),
            PlanStatus::Failed => write!(f, "Failed"),
        }
    }
}

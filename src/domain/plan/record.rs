use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::PlanEvent;
use super::value_objects::PlanStatus;
use crate::agents::errors::{AgentError, AgentResult};
use crate::domain::memory::{plan_status_key, SharedMemory};

const UNSPECIFIED_FAILURE: &str = "step failed without a reason";

/// Plan Status Record aggregate
///
/// Tracks one agent's progress through its self-declared plan. Stored in
/// shared memory under `<agent_name>_plan_status`.
///
/// # Invariants
/// - `plan` has at least one step
/// - `current_step_index` is -1 before execution, else a valid index, and never decreases
/// - `status` only moves along [`PlanStatus::can_transition_to`]
/// - `error_message` is set if and only if `status` is Failed
///
/// # Example
/// ```
/// use seo_agent_hub::domain::plan::{PlanStatus, PlanStatusRecord};
///
/// let (mut record, _) = PlanStatusRecord::new(vec!["Fetch".into(), "Store".into()]).unwrap();
/// record.begin_step(0).unwrap();
/// record.begin_step(1).unwrap();
/// record.complete().unwrap();
/// assert_eq!(record.status(), PlanStatus::Completed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStatusRecord {
    plan: Vec<String>,
    current_step_index: i64,
    status: PlanStatus,
    last_update: DateTime<Utc>,
    error_message: Option<String>,
}

impl PlanStatusRecord {
    /// Creates a record in NotStarted with the full plan populated
    ///
    /// # Returns
    /// * `Ok((PlanStatusRecord, PlanEvent))` - New record and its Created event
    /// * `Err(AgentError::InvalidPlanRecord)` - If the plan is empty or has a blank step
    pub fn new(plan: Vec<String>) -> AgentResult<(Self, PlanEvent)> {
        if plan.is_empty() {
            return Err(AgentError::InvalidPlanRecord(
                "plan must contain at least one step".to_string(),
            ));
        }
        if plan.iter().any(|step| step.trim().is_empty()) {
            return Err(AgentError::InvalidPlanRecord(
                "plan steps cannot be blank".to_string(),
            ));
        }

        let record = Self {
            plan,
            current_step_index: -1,
            status: PlanStatus::NotStarted,
            last_update: Utc::now(),
            error_message: None,
        };
        let event = PlanEvent::Created {
            steps: record.plan.len(),
            at: record.last_update,
        };
        Ok((record, event))
    }

    /// Record for a task with no explicit plan
    pub fn single_step(description: impl Into<String>) -> AgentResult<(Self, PlanEvent)> {
        Self::new(vec![description.into()])
    }

    /// Moves to InProgress on step `index`
    ///
    /// # Business Rules
    /// - Status must be NotStarted or InProgress
    /// - `index` must be past the current step and inside the plan
    pub fn begin_step(&mut self, index: usize) -> AgentResult<PlanEvent> {
        self.ensure_transition(PlanStatus::InProgress)?;
        let next = index as i64;
        if next <= self.current_step_index || index >= self.plan.len() {
            return Err(AgentError::InvalidStateTransition {
                from: format!("{} at step {}", self.status, self.current_step_index),
                to: format!("{} at step {}", PlanStatus::InProgress, index),
            });
        }

        self.current_step_index = next;
        self.status = PlanStatus::InProgress;
        self.touch();

        Ok(PlanEvent::StepStarted {
            index,
            description: self.plan[index].clone(),
            at: self.last_update,
        })
    }

    /// Marks the plan Completed once its last step has run
    pub fn complete(&mut self) -> AgentResult<PlanEvent> {
        self.ensure_transition(PlanStatus::Completed)?;
        let last = self.plan.len() as i64 - 1;
        if self.current_step_index != last {
            return Err(AgentError::InvalidStateTransition {
                from: format!("{} at step {}", self.status, self.current_step_index),
                to: format!("{} (last step is {})", PlanStatus::Completed, last),
            });
        }

        self.status = PlanStatus::Completed;
        self.touch();

        Ok(PlanEvent::Completed {
            at: self.last_update,
        })
    }

    /// Marks the plan Failed on the current step
    pub fn fail(&mut self, reason: impl Into<String>) -> AgentResult<PlanEvent> {
        self.ensure_transition(PlanStatus::Failed)?;
        let mut reason = reason.into();
        if reason.trim().is_empty() {
            reason = UNSPECIFIED_FAILURE.to_string();
        }

        self.status = PlanStatus::Failed;
        self.error_message = Some(reason.clone());
        self.touch();

        Ok(PlanEvent::Failed {
            step: self.current_step_index,
            reason,
            at: self.last_update,
        })
    }

    fn ensure_transition(&self, next: PlanStatus) -> AgentResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(AgentError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            })
        }
    }

    // last_update never moves backwards, even if the wall clock does
    fn touch(&mut self) {
        self.last_update = Utc::now().max(self.last_update);
    }

    /// Checks every invariant; used on records read back from shared memory
    pub fn validate(&self) -> AgentResult<()> {
        let invalid = |msg: String| Err(AgentError::InvalidPlanRecord(msg));

        if self.plan.is_empty() {
            return invalid("plan is empty".to_string());
        }
        if self.current_step_index < -1 || self.current_step_index >= self.plan.len() as i64 {
            return invalid(format!(
                "current_step_index {} outside plan of {} steps",
                self.current_step_index,
                self.plan.len()
            ));
        }
        match (self.status, self.current_step_index) {
            (PlanStatus::NotStarted, i) if i != -1 => {
                return invalid(format!("NotStarted record has current_step_index {}", i))
            }
            (PlanStatus::InProgress | PlanStatus::Completed, -1) => {
                return invalid(format!("{} record has no current step", self.status))
            }
            _ => {}
        }
        if self.status == PlanStatus::Completed
            && self.current_step_index != self.plan.len() as i64 - 1
        {
            return invalid("Completed record did not reach the last step".to_string());
        }
        match (&self.status, &self.error_message) {
            (PlanStatus::Failed, None) => invalid("Failed record has no error_message".to_string()),
            (PlanStatus::Failed, Some(_)) => Ok(()),
            (status, Some(_)) => invalid(format!("{} record carries an error_message", status)),
            (_, None) => Ok(()),
        }
    }

    /// Parses and validates a record stored as JSON
    pub fn from_value(value: Value) -> AgentResult<Self> {
        let record: Self = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    pub fn to_value(&self) -> Value {
        // Plain struct of strings, numbers and a timestamp: serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    // ===== Getters =====

    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    pub fn current_step_index(&self) -> i64 {
        self.current_step_index
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Reads and validates an agent's plan status record from shared memory
///
/// # Returns
/// * `Ok(None)` - The agent has not written a record
/// * `Ok(Some(record))` - A valid record
/// * `Err(_)` - The stored value violates the record contract
pub fn read_plan_status(
    memory: &SharedMemory,
    agent_name: &str,
) -> AgentResult<Option<PlanStatusRecord>> {
    memory
        .get(&plan_status_key(agent_name))
        .map(PlanStatusRecord::from_value)
        .transpose()
}

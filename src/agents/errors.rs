use thiserror::Error;
use uuid::Uuid;

use crate::tools::ToolFault;

/// Errors that can occur in the agent system
#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed or inconsistent agent/team descriptor. Fatal at load time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Prerequisite missing for {agent}: key '{key}' is not in shared memory")]
    PrerequisiteMissing { agent: String, key: String },

    #[error("Step {step} failed: {reason}")]
    StepExecution { step: usize, reason: String },

    #[error(transparent)]
    Tool(#[from] ToolFault),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid plan status record: {0}")]
    InvalidPlanRecord(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run not found: {0}")]
    RunNotFound(Uuid),
}

impl AgentError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        AgentError::Configuration(message.into())
    }

    /// Returns true when this error must stop the affected team from starting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::Configuration(_) | AgentError::Yaml(_) | AgentError::Io(_)
        )
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(AgentError::config("duplicate agent").is_fatal());
        assert!(!AgentError::StepExecution {
            step: 0,
            reason: "quota".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn prerequisite_message_names_key() {
        let err = AgentError::PrerequisiteMissing {
            agent: "keyword_analysis_agent".to_string(),
            key: "ga_data".to_string(),
        };
        assert!(err.to_string().contains("'ga_data'"));
    }
}

use serde::{Deserialize, Serialize};

use crate::agents::errors::{AgentError, AgentResult};
use crate::domain::memory::MemoryMode;

/// Team configuration record as written in the declarative YAML files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    /// Kept as a string so an unknown value surfaces as a configuration error
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
}

/// A named group of agents sharing one memory scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamDescriptor {
    name: String,
    description: String,
    agents: Vec<String>,
    memory: MemoryMode,
    instructions: Option<String>,
    tools: Vec<String>,
}

impl TeamDescriptor {
    /// Builds a descriptor from its configuration record
    ///
    /// # Business Rules Enforced
    /// - `name` must be present
    /// - at least one member agent
    /// - no member listed twice
    /// - `memory` must be a recognized mode (defaults to shared when absent)
    ///
    /// Member names are resolved later, against the loaded agent set.
    pub fn from_config(config: TeamConfig) -> AgentResult<Self> {
        let name = config
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AgentError::config("Team configuration is missing 'name'"))?;

        if config.agents.is_empty() {
            return Err(AgentError::config(format!("Team '{}' has no agents", name)));
        }
        for (i, agent) in config.agents.iter().enumerate() {
            if config.agents[..i].contains(agent) {
                return Err(AgentError::config(format!(
                    "Team '{}' lists agent '{}' more than once",
                    name, agent
                )));
            }
        }

        let memory = match config.memory.as_deref() {
            Some(mode) => mode.parse::<MemoryMode>().map_err(|_| {
                AgentError::config(format!(
                    "Team '{}' has unrecognized memory mode '{}'",
                    name, mode
                ))
            })?,
            None => MemoryMode::default(),
        };

        Ok(Self {
            name,
            description: config.description.unwrap_or_default(),
            agents: config.agents,
            memory,
            instructions: config.instructions,
            tools: config.tools.unwrap_or_default(),
        })
    }

    pub fn new(name: impl Into<String>, agents: Vec<String>, memory: MemoryMode) -> AgentResult<Self> {
        Self::from_config(TeamConfig {
            name: Some(name.into()),
            agents,
            memory: Some(memory.to_string()),
            ..TeamConfig::default()
        })
    }

    // ===== Getters =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Member agent names, in execution order
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub fn memory(&self) -> MemoryMode {
        self.memory
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Tools available to every member
    pub fn tools(&self) -> &[String] {
        &self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(agents: &[&str], memory: Option<&str>) -> TeamConfig {
        TeamConfig {
            name: Some("data_collection_team".to_string()),
            agents: agents.iter().map(|a| a.to_string()).collect(),
            memory: memory.map(str::to_string),
            ..TeamConfig::default()
        }
    }

    #[test]
    fn create_team_descriptor() {
        let team = TeamDescriptor::from_config(config(
            &["ga_agent", "search_console_agent"],
            Some("shared"),
        ))
        .unwrap();

        assert_eq!(team.name(), "data_collection_team");
        assert_eq!(team.agents().len(), 2);
        assert_eq!(team.memory(), MemoryMode::Shared);
    }

    #[test]
    fn duplicate_member_fails() {
        let result = TeamDescriptor::from_config(config(&["ga_agent", "ga_agent"], None));
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[test]
    fn unknown_memory_mode_fails() {
        let result = TeamDescriptor::from_config(config(&["ga_agent"], Some("global")));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("data_collection_team"));
    }

    #[test]
    fn empty_team_fails() {
        assert!(TeamDescriptor::from_config(config(&[], None)).is_err());
    }

    #[test]
    fn missing_memory_defaults_to_shared() {
        let team = TeamDescriptor::from_config(config(&["ga_agent"], None)).unwrap();
        assert_eq!(team.memory(), MemoryMode::Shared);
        assert!(team.tools().is_empty());
    }
}

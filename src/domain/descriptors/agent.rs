use serde::{Deserialize, Serialize};

use crate::agents::errors::{AgentError, AgentResult};

/// Model used when an agent file does not name one
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Agent configuration record as written in the declarative YAML files
///
/// Unknown fields are ignored. Only `name` is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A named, configured agent: instructions, tools and a target model
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDescriptor {
    name: String,
    description: String,
    instruction: String,
    tools: Vec<String>,
    model: String,
}

impl AgentDescriptor {
    /// Builds a descriptor from its configuration record
    ///
    /// # Returns
    /// * `Err(AgentError::Configuration)` - If `name` is missing or blank,
    ///   or a tool is listed twice
    pub fn from_config(config: AgentConfig) -> AgentResult<Self> {
        let name = config
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AgentError::config("Agent configuration is missing 'name'"))?;

        let tools = config.tools.unwrap_or_default();
        for (i, tool) in tools.iter().enumerate() {
            if tool.trim().is_empty() {
                return Err(AgentError::config(format!(
                    "Agent '{}' lists an empty tool identifier",
                    name
                )));
            }
            if tools[..i].contains(tool) {
                return Err(AgentError::config(format!(
                    "Agent '{}' lists tool '{}' more than once",
                    name, tool
                )));
            }
        }

        let model = config
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            name,
            description: config.description.unwrap_or_default(),
            instruction: config.system_prompt.unwrap_or_default(),
            tools,
            model,
        })
    }

    pub fn new(name: impl Into<String>, tools: Vec<String>) -> AgentResult<Self> {
        Self::from_config(AgentConfig {
            name: Some(name.into()),
            tools: Some(tools),
            ..AgentConfig::default()
        })
    }

    // ===== Getters =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

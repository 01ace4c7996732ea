use std::collections::BTreeMap;

use serde::Serialize;

use super::agent::AgentDescriptor;
use super::team::TeamDescriptor;
use crate::agents::errors::{AgentError, AgentResult};

/// All agent and team descriptors loaded from configuration
///
/// Ordered maps so two loads of the same files compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptorSet {
    agents: BTreeMap<String, AgentDescriptor>,
    teams: BTreeMap<String, TeamDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an agent; names are unique across the set
    pub fn add_agent(&mut self, agent: AgentDescriptor) -> AgentResult<()> {
        if self.agents.contains_key(agent.name()) {
            return Err(AgentError::config(format!(
                "Duplicate agent name: {}",
                agent.name()
            )));
        }
        self.agents.insert(agent.name().to_string(), agent);
        Ok(())
    }

    /// Adds a team; names are unique across the set
    pub fn add_team(&mut self, team: TeamDescriptor) -> AgentResult<()> {
        if self.teams.contains_key(team.name()) {
            return Err(AgentError::config(format!(
                "Duplicate team name: {}",
                team.name()
            )));
        }
        self.teams.insert(team.name().to_string(), team);
        Ok(())
    }

    pub fn agent(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.get(name)
    }

    pub fn team(&self, name: &str) -> Option<&TeamDescriptor> {
        self.teams.get(name)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamDescriptor> {
        self.teams.values()
    }

    /// Looks up a team and every member descriptor, in member order
    ///
    /// # Returns
    /// * `Err(AgentError::Configuration)` - Unknown team or unresolved member
    pub fn resolve_team(&self, name: &str) -> AgentResult<(&TeamDescriptor, Vec<&AgentDescriptor>)> {
        let team = self
            .team(name)
            .ok_or_else(|| AgentError::config(format!("Unknown team: {}", name)))?;
        let members = team
            .agents()
            .iter()
            .map(|agent| {
                self.agent(agent).ok_or_else(|| {
                    AgentError::config(format!(
                        "Team '{}' references unknown agent '{}'",
                        team.name(),
                        agent
                    ))
                })
            })
            .collect::<AgentResult<Vec<_>>>()?;
        Ok((team, members))
    }

    /// Checks that every team member resolves to a loaded agent
    pub fn validate(&self) -> AgentResult<()> {
        for team in self.teams.keys() {
            self.resolve_team(team)?;
        }
        Ok(())
    }
}

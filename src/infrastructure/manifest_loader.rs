//! Declarative agent and team files
//!
//! One YAML record per file (`*.yaml` or `*.yml`), read in file name order.
//! Any malformed or inconsistent file fails the whole load.

use std::path::{Path, PathBuf};

use crate::agents::errors::{AgentError, AgentResult};
use crate::domain::descriptors::{
    AgentConfig, AgentDescriptor, DescriptorSet, TeamConfig, TeamDescriptor,
};

/// Parses one agent file
pub fn parse_agent_yaml(yaml: &str) -> AgentResult<AgentDescriptor> {
    let config: AgentConfig = serde_yaml::from_str(yaml)?;
    AgentDescriptor::from_config(config)
}

/// Parses one team file
pub fn parse_team_yaml(yaml: &str) -> AgentResult<TeamDescriptor> {
    let config: TeamConfig = serde_yaml::from_str(yaml)?;
    TeamDescriptor::from_config(config)
}

/// Loads every agent and team file and checks that all team members resolve
///
/// # Arguments
/// * `agents_dir` - Directory of agent files
/// * `teams_dir` - Directory of team files
///
/// # Returns
/// * `Ok(DescriptorSet)` - Loading the same files twice yields equal sets
/// * `Err(AgentError::Configuration)` - Missing directory, bad file,
///   duplicate name or unresolved member
pub fn load_descriptors(agents_dir: &Path, teams_dir: &Path) -> AgentResult<DescriptorSet> {
    let mut set = DescriptorSet::new();

    for path in yaml_files(agents_dir)? {
        let agent = read(&path).and_then(|yaml| parse_agent_yaml(&yaml)).map_err(|e| in_file(&path, e))?;
        tracing::debug!(agent = %agent.name(), file = %path.display(), "Loaded agent descriptor");
        set.add_agent(agent).map_err(|e| in_file(&path, e))?;
    }

    for path in yaml_files(teams_dir)? {
        let team = read(&path).and_then(|yaml| parse_team_yaml(&yaml)).map_err(|e| in_file(&path, e))?;
        tracing::debug!(team = %team.name(), file = %path.display(), "Loaded team descriptor");
        set.add_team(team).map_err(|e| in_file(&path, e))?;
    }

    set.validate()?;
    tracing::info!(
        agents = set.agents().count(),
        teams = set.teams().count(),
        "Descriptors loaded"
    );
    Ok(set)
}

fn yaml_files(dir: &Path) -> AgentResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AgentError::config(format!(
            "Descriptor directory not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path) -> AgentResult<String> {
    Ok(std::fs::read_to_string(path)?)
}

fn in_file(path: &Path, error: AgentError) -> AgentError {
    AgentError::config(format!("{}: {}", path.display(), error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memory::MemoryMode;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let agents = root.path().join("agents");
        let teams = root.path().join("teams");
        fs::create_dir_all(&agents).unwrap();
        fs::create_dir_all(&teams).unwrap();
        (root, agents, teams)
    }

    #[test]
    fn agent_yaml_ignores_unknown_fields() {
        let agent = parse_agent_yaml(
            "name: ga_agent\ntools: [ga_connector]\ntemperature: 0.2\n",
        )
        .unwrap();

        assert_eq!(agent.name(), "ga_agent");
        assert_eq!(agent.tools(), ["ga_connector".to_string()]);
    }

    #[test]
    fn team_memory_defaults_to_shared() {
        let team = parse_team_yaml("name: analysis_team\nagents: [keyword_analysis_agent]\n").unwrap();
        assert_eq!(team.memory(), MemoryMode::Shared);
    }

    #[test]
    fn loads_directories() {
        let (_root, agents, teams) = fixture();
        write(&agents, "ga_agent.yaml", "name: ga_agent\ntools: [ga_connector]\n");
        write(&agents, "notes.txt", "not a descriptor");
        write(&teams, "team.yml", "name: data_collection_team\nagents: [ga_agent]\n");

        let set = load_descriptors(&agents, &teams).unwrap();
        assert!(set.agent("ga_agent").is_some());
        assert!(set.team("data_collection_team").is_some());
        assert_eq!(set, load_descriptors(&agents, &teams).unwrap());
    }

    #[test]
    fn missing_name_names_the_file() {
        let (_root, agents, teams) = fixture();
        write(&agents, "broken.yaml", "description: no name\n");

        let err = load_descriptors(&agents, &teams).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(ref m) if m.contains("broken.yaml")));
    }

    #[test]
    fn unresolved_member_fails_load() {
        let (_root, agents, teams) = fixture();
        write(&agents, "ga_agent.yaml", "name: ga_agent\n");
        write(&teams, "team.yaml", "name: data_collection_team\nagents: [ga_agent, sc_agent]\n");

        assert!(matches!(
            load_descriptors(&agents, &teams),
            Err(AgentError::Configuration(_))
        ));
    }

    #[test]
    fn missing_directory_is_configuration_error() {
        let (root, _agents, teams) = fixture();
        let err = load_descriptors(&root.path().join("nope"), &teams).unwrap_err();
        assert!(err.is_fatal());
    }
}

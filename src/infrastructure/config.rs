use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agents::errors::{AgentError, AgentResult};

/// Environment variable prefixes collected as credentials
pub const CREDENTIAL_PREFIXES: [&str; 6] = [
    "GA_",
    "SEARCH_CONSOLE_",
    "MERCHANT_CENTER_",
    "SEMRUSH_",
    "FIRECRAWL_",
    "MCP_",
];

pub const DEFAULT_AGENTS_DIR: &str = "config/agents";
pub const DEFAULT_TEAMS_DIR: &str = "config/teams";
pub const DEFAULT_KNOWLEDGE_PATH: &str = "config/knowledge.yaml";
pub const DEFAULT_SNAPSHOT_DIR: &str = "config/snapshots";
pub const DEFAULT_PIPELINE: [&str; 2] = ["data_collection_team", "analysis_team"];
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_RUNS: usize = 100;

/// Opaque integration secrets (service account paths, property ids, API keys)
///
/// Each tool receives the entries under its own prefixes, untouched. `Debug`
/// prints key names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    values: BTreeMap<String, String>,
}

impl Credentials {
    /// Collects every variable whose name starts with a credential prefix
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let values = vars
            .into_iter()
            .filter(|(key, _)| CREDENTIAL_PREFIXES.iter().any(|p| key.starts_with(p)))
            .collect();
        Self { values }
    }

    /// Overrides entries key by key with a flat JSON object read from `path`
    ///
    /// Non-string values are kept in their JSON text form.
    pub fn merge_file(&mut self, path: &Path) -> AgentResult<()> {
        let text = std::fs::read_to_string(path)?;
        let file: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)?;
        for (key, value) in file {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            self.values.insert(key, value);
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The entries whose name starts with one of `prefixes`, for one tool
    pub fn scoped(&self, prefixes: &[&str]) -> Credentials {
        Self {
            values: self
                .values
                .iter()
                .filter(|(key, _)| prefixes.iter().any(|p| key.starts_with(p)))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Process configuration, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub agents_dir: PathBuf,
    pub teams_dir: PathBuf,
    pub knowledge_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub pipeline: Vec<String>,
    pub step_timeout: Option<Duration>,
    pub tool_max_attempts: u32,
    /// Finished runs kept in memory before the oldest is dropped
    pub max_runs: usize,
    pub bind_addr: String,
    pub credentials: Credentials,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agents_dir: PathBuf::from(DEFAULT_AGENTS_DIR),
            teams_dir: PathBuf::from(DEFAULT_TEAMS_DIR),
            knowledge_path: PathBuf::from(DEFAULT_KNOWLEDGE_PATH),
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            pipeline: DEFAULT_PIPELINE.iter().map(|s| s.to_string()).collect(),
            step_timeout: None,
            tool_max_attempts: 1,
            max_runs: DEFAULT_MAX_RUNS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment
    pub fn from_env() -> AgentResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Builds the configuration from `(name, value)` pairs
    ///
    /// # Returns
    /// * `Err(AgentError::Configuration)` - A numeric setting does not parse,
    ///   the pipeline is empty, or `SEO_CONFIG_FILE` cannot be read
    pub fn from_vars<I>(vars: I) -> AgentResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let defaults = Self::default();
        let pipeline = match lookup(&vars, "SEO_PIPELINE") {
            Some(list) => {
                let teams: Vec<String> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if teams.is_empty() {
                    return Err(AgentError::config("SEO_PIPELINE names no teams"));
                }
                teams
            }
            None => defaults.pipeline.clone(),
        };

        let step_timeout = lookup(&vars, "SEO_STEP_TIMEOUT_SECS")
            .map(|v| parse_number::<u64>("SEO_STEP_TIMEOUT_SECS", v))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let tool_max_attempts = lookup(&vars, "SEO_TOOL_MAX_ATTEMPTS")
            .map(|v| parse_number::<u32>("SEO_TOOL_MAX_ATTEMPTS", v))
            .transpose()?
            .unwrap_or(defaults.tool_max_attempts)
            .max(1);

        let max_runs = lookup(&vars, "SEO_MAX_RUNS")
            .map(|v| parse_number::<usize>("SEO_MAX_RUNS", v))
            .transpose()?
            .unwrap_or(defaults.max_runs)
            .max(1);

        let bind_addr = lookup(&vars, "BIND_ADDR").map(str::to_string).unwrap_or_else(|| {
            tracing::warn!("BIND_ADDR not set, using default {}", DEFAULT_BIND_ADDR);
            DEFAULT_BIND_ADDR.to_string()
        });

        let mut credentials = Credentials::from_vars(vars.clone());
        if let Some(file) = lookup(&vars, "SEO_CONFIG_FILE") {
            credentials.merge_file(Path::new(file)).map_err(|e| {
                AgentError::config(format!("Could not load SEO_CONFIG_FILE {}: {}", file, e))
            })?;
        }

        Ok(Self {
            agents_dir: path_or(&vars, "SEO_AGENTS_DIR", defaults.agents_dir),
            teams_dir: path_or(&vars, "SEO_TEAMS_DIR", defaults.teams_dir),
            knowledge_path: path_or(&vars, "SEO_KNOWLEDGE_PATH", defaults.knowledge_path),
            snapshot_dir: path_or(&vars, "SEO_SNAPSHOT_DIR", defaults.snapshot_dir),
            pipeline,
            step_timeout,
            tool_max_attempts,
            max_runs,
            bind_addr,
            credentials,
        })
    }
}

fn lookup<'a>(vars: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn path_or(vars: &BTreeMap<String, String>, name: &str, default: PathBuf) -> PathBuf {
    match lookup(vars, name) {
        Some(value) => PathBuf::from(value),
        None => {
            tracing::warn!("{} not set, using default {}", name, default.display());
            default
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> AgentResult<T> {
    value
        .parse()
        .map_err(|_| AgentError::config(format!("{} must be a whole number, got '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();

        assert_eq!(config.agents_dir, PathBuf::from("config/agents"));
        assert_eq!(config.pipeline, vec!["data_collection_team", "analysis_team"]);
        assert_eq!(config.tool_max_attempts, 1);
        assert_eq!(config.step_timeout, None);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.max_runs, DEFAULT_MAX_RUNS);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("SEO_PIPELINE", "analysis_team, "),
            ("SEO_STEP_TIMEOUT_SECS", "30"),
            ("SEO_TOOL_MAX_ATTEMPTS", "3"),
            ("SEO_MAX_RUNS", "25"),
        ]))
        .unwrap();

        assert_eq!(config.pipeline, vec!["analysis_team"]);
        assert_eq!(config.step_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.tool_max_attempts, 3);
        assert_eq!(config.max_runs, 25);
    }

    #[test]
    fn bad_numbers_are_configuration_errors() {
        let err = AppConfig::from_vars(vars(&[("SEO_TOOL_MAX_ATTEMPTS", "three")])).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn credentials_collect_known_prefixes_only() {
        let credentials = Credentials::from_vars(vars(&[
            ("GA_PROPERTY_ID", "123"),
            ("SEMRUSH_API_KEY", "secret"),
            ("HOME", "/root"),
        ]));

        assert_eq!(credentials.keys(), vec!["GA_PROPERTY_ID", "SEMRUSH_API_KEY"]);
        assert_eq!(credentials.scoped(&["GA_"]).keys(), vec!["GA_PROPERTY_ID"]);
    }

    #[test]
    fn debug_output_hides_values() {
        let credentials = Credentials::from_vars(vars(&[("SEMRUSH_API_KEY", "hunter2")]));
        let printed = format!("{:?}", credentials);

        assert!(printed.contains("SEMRUSH_API_KEY"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn config_file_overrides_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"GA_PROPERTY_ID": "456", "MCP_PORT": 8080}}"#).unwrap();

        let config = AppConfig::from_vars(vars(&[
            ("GA_PROPERTY_ID", "123"),
            ("SEO_CONFIG_FILE", file.path().to_str().unwrap()),
        ]))
        .unwrap();

        assert_eq!(config.credentials.get("GA_PROPERTY_ID"), Some("456"));
        assert_eq!(config.credentials.get("MCP_PORT"), Some("8080"));
    }
}

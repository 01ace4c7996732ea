use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agents::errors::AgentError;

/// Memory visibility mode of a team
///
/// - `Shared`: every member agent reads and writes one store
/// - `Isolated`: each member gets a private store holding only the run's seeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    #[default]
    Shared,
    Isolated,
}

impl FromStr for MemoryMode {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(MemoryMode::Shared),
            "isolated" => Ok(MemoryMode::Isolated),
            other => Err(AgentError::config(format!(
                "Unrecognized memory mode '{}' (expected 'shared' or 'isolated')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MemoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryMode::Shared => write!(f, "shared"),
            MemoryMode::Isolated => write!(f, "isolated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("shared".parse::<MemoryMode>().unwrap(), MemoryMode::Shared);
        assert_eq!(" Isolated ".parse::<MemoryMode>().unwrap(), MemoryMode::Isolated);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "global".parse::<MemoryMode>().unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn display_round_trips_with_parse() {
        for mode in [MemoryMode::Shared, MemoryMode::Isolated] {
            assert_eq!(mode.to_string().parse::<MemoryMode>().unwrap(), mode);
        }
    }
}

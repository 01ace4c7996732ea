use std::path::Path;

use serde_json::Value;

use crate::agents::errors::{AgentError, AgentResult};

/// Loads the SEO knowledge document exposed to agents as read-only context
///
/// The file is YAML; its top level must be a mapping (general guidance,
/// project context, content rules, ...). Contents are otherwise free-form.
pub fn load_knowledge(path: &Path) -> AgentResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AgentError::config(format!("Cannot read knowledge file {}: {}", path.display(), e))
    })?;
    let document = parse_knowledge(&text)?;
    tracing::info!(
        file = %path.display(),
        sections = document.as_object().map_or(0, |o| o.len()),
        "Knowledge context loaded"
    );
    Ok(document)
}

pub fn parse_knowledge(yaml: &str) -> AgentResult<Value> {
    if yaml.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let document: Value = serde_yaml::from_str(yaml)?;
    match document {
        Value::Object(_) => Ok(document),
        Value::Null => Ok(Value::Object(Default::default())),
        _ => Err(AgentError::config(
            "Knowledge document must be a mapping of sections",
        )),
    }
}

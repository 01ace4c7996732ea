use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by an external tool or service
///
/// The owning agent decides what to do with it; `retryable` only tells the
/// retry policy whether another attempt may succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Tool '{tool}' failed: {message}")]
pub struct ToolFault {
    pub tool: String,
    pub message: String,
    pub retryable: bool,
}

impl ToolFault {
    /// A fault that will not go away by calling again (bad request, missing credentials)
    pub fn permanent(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// A transient fault (rate limit, timeout, upstream 5xx)
    pub fn transient(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
            retryable: true,
        }
    }
}

// Agent system modules
//
// Runtime behind the configured agents: the workflow contract, the runner
// that keeps plan status records current, the information hierarchy used to
// reconcile overlapping sources, and the concrete SEO workflows.

pub mod catalog;
pub mod errors;
pub mod hierarchy;
pub mod runner;
pub mod sources;
pub mod types;
pub mod workflow;
pub mod workflows;

// Re-export main types
pub use catalog::WorkflowCatalog;
pub use errors::{AgentError, AgentResult};
pub use hierarchy::{Claim, InformationHierarchy, Resolution, SourceClass};
pub use runner::{Agent, RunSettings};
pub use types::{AgentRunReport, RunOutcome};
pub use workflow::{AgentWorkflow, StepContext, ToolRequirement};

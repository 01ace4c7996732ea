// Shared memory domain module
// Contains the team-scoped key-value store and its visibility mode

pub mod mode;
pub mod store;

pub use mode::MemoryMode;
pub use store::{SharedMemory, WriteConflict, SEED_WRITER};

/// Key under which the knowledge-context document is exposed to agents
pub const KNOWLEDGE_CONTEXT_KEY: &str = "seo_knowledge_context";

/// Key under which the orchestrator stores the product being processed
pub const PRODUCT_DATA_KEY: &str = "initial_product_data";

/// Shared-memory key of an agent's plan status record
pub fn plan_status_key(agent_name: &str) -> String {
    format!("{}_plan_status", agent_name)
}

//! SEO Agent Hub Library
//!
//! Configured SEO agents that cooperate through a team-scoped shared memory
//! store, each publishing a plan status record as it works through its plan.
//! Includes the domain model, the agent runtime, tool adapters, the product
//! orchestrator and its HTTP surface.

pub mod agents;
pub mod api;
pub mod context_builder;
pub mod domain;
pub mod infrastructure;
pub mod orchestrator;
pub mod tools;

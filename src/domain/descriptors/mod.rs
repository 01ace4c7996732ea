// Descriptor domain module
// Immutable agent and team descriptors built from configuration records

pub mod agent;
pub mod set;
pub mod team;

pub use agent::{AgentConfig, AgentDescriptor, DEFAULT_MODEL};
pub use set::DescriptorSet;
pub use team::{TeamConfig, TeamDescriptor};

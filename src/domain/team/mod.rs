// Team domain module
// Contains the runnable team aggregate, its run status, and team events

#![allow(clippy::module_inception)]

pub mod events;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use events::TeamEvent;
pub use team::{Team, TeamRunReport};
pub use value_objects::TeamRunStatus;

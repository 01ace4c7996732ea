// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod descriptors;
pub mod memory;
pub mod plan;
pub mod repositories;
pub mod run;
pub mod team;

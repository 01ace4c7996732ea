// HTTP handlers
// Thin adapters from requests to the orchestrator and run repository

pub mod health;
pub mod runs;
pub mod teams;

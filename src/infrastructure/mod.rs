// Infrastructure layer module
// Contains configuration, file loaders, tool adapters and repository adapters
// Follows Hexagonal Architecture

pub mod config;
pub mod knowledge;
pub mod manifest_loader;
pub mod repositories;
pub mod tools;

// Repository ports
// Implemented by adapters in the infrastructure layer

pub mod run_repository;

pub use run_repository::RunRepository;

// Product run domain module
// The record kept for every orchestrated product run

pub mod report;

pub use report::{RunReport, RunSummary, TeamSummary};

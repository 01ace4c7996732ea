// Concrete agent workflows
//
// Data collection agents publish one source each; analysis agents read
// those sources and publish structured findings.

pub mod competitor_analysis;
pub mod content_optimization;
pub mod data_collection;
pub mod keyword_analysis;

pub use competitor_analysis::CompetitorAnalysisWorkflow;
pub use content_optimization::ContentOptimizationWorkflow;
pub use data_collection::{CollectionSource, DataCollectionWorkflow};
pub use keyword_analysis::KeywordAnalysisWorkflow;

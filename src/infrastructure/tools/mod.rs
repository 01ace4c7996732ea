// Tool adapters
// File-backed implementations of the tool interfaces and the table of
// standard tool identifiers the shipped agent files refer to

pub mod snapshot;

use std::path::Path;
use std::sync::Arc;

pub use snapshot::{SnapshotConnector, SnapshotScraper};

use crate::infrastructure::config::Credentials;
use crate::tools::ToolRegistry;

/// Identifier and upstream source of every standard connector
pub const STANDARD_CONNECTORS: [(&str, &str); 5] = [
    ("ga_connector", "google_analytics"),
    ("search_console_connector", "search_console"),
    ("merchant_center_connector", "merchant_center"),
    ("semrush_connector", "semrush"),
    ("trends_connector", "google_trends"),
];

/// Identifier of the standard web scraper
pub const STANDARD_SCRAPER: &str = "firecrawl";

/// Credential prefixes each standard tool may see
pub fn credential_scope(tool: &str) -> &'static [&'static str] {
    match tool {
        "ga_connector" => &["GA_"],
        "search_console_connector" => &["SEARCH_CONSOLE_"],
        "merchant_center_connector" => &["MERCHANT_CENTER_"],
        "semrush_connector" => &["SEMRUSH_"],
        STANDARD_SCRAPER => &["FIRECRAWL_", "MCP_"],
        // Trends is public
        _ => &[],
    }
}

/// Builds the standard connectors, each holding only its own credentials
pub fn snapshot_connectors(dir: &Path, credentials: &Credentials) -> Vec<SnapshotConnector> {
    STANDARD_CONNECTORS
        .iter()
        .map(|(tool, source)| {
            SnapshotConnector::new(*tool, *source, dir)
                .with_credentials(credentials.scoped(credential_scope(tool)))
        })
        .collect()
}

/// Registers every standard tool, answering from snapshots under `dir`
pub fn snapshot_registry(dir: &Path, credentials: &Credentials) -> ToolRegistry {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Snapshot directory not found, tool calls will fail");
    }

    let mut registry = ToolRegistry::new();
    for connector in snapshot_connectors(dir, credentials) {
        let tool = connector.tool().to_string();
        tracing::debug!(tool = %tool, credentials = connector.credentials().len(), "Registering snapshot connector");
        registry.register_data_source(tool, Arc::new(connector));
    }
    let scraper = SnapshotScraper::new(STANDARD_SCRAPER, dir)
        .with_credentials(credentials.scoped(credential_scope(STANDARD_SCRAPER)));
    registry.register_scraper(STANDARD_SCRAPER, Arc::new(scraper));
    registry
}

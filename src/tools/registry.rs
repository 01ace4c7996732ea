use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::fault::ToolFault;
use super::requests::{DataSourceRequest, ScrapeRequest};
use crate::agents::errors::{AgentError, AgentResult};

/// Connector to a structured analytics source (GA4, Search Console,
/// Merchant Center, SEMrush, Trends)
#[async_trait]
pub trait DataSourceConnector: Send + Sync {
    /// Name of the upstream source, e.g. `google_analytics`
    fn source_name(&self) -> &str;

    /// Whether the connector has what it needs to authenticate.
    /// Connectors without credentials are not registered.
    fn has_credentials(&self) -> bool {
        true
    }

    async fn fetch(&self, request: &DataSourceRequest) -> Result<Value, ToolFault>;
}

/// Unstructured web crawling/scraping capability (Firecrawl)
#[async_trait]
pub trait WebScraper: Send + Sync {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Value, ToolFault>;
}

/// A resolved tool, tagged by capability category
#[derive(Clone)]
pub enum ToolHandle {
    DataSource(Arc<dyn DataSourceConnector>),
    Scraper(Arc<dyn WebScraper>),
}

impl ToolHandle {
    pub fn category(&self) -> &'static str {
        match self {
            ToolHandle::DataSource(_) => "data_source",
            ToolHandle::Scraper(_) => "web_scraper",
        }
    }
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolHandle::DataSource(c) => write!(f, "DataSource({})", c.source_name()),
            ToolHandle::Scraper(_) => write!(f, "Scraper"),
        }
    }
}

/// Lookup table from tool identifier to implementation
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolHandle>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a data-source connector under `name`
    ///
    /// Returns false (and skips registration) when the connector reports
    /// missing credentials, so agents depending on it fail at construction.
    pub fn register_data_source(
        &mut self,
        name: impl Into<String>,
        connector: Arc<dyn DataSourceConnector>,
    ) -> bool {
        let name = name.into();
        if !connector.has_credentials() {
            tracing::warn!(tool = %name, source = connector.source_name(), "Skipping tool without credentials");
            return false;
        }
        tracing::debug!(tool = %name, "Registered data source tool");
        self.tools.insert(name, ToolHandle::DataSource(connector));
        true
    }

    /// Register a web scraper under `name`
    pub fn register_scraper(&mut self, name: impl Into<String>, scraper: Arc<dyn WebScraper>) {
        let name = name.into();
        tracing::debug!(tool = %name, "Registered scraper tool");
        self.tools.insert(name, ToolHandle::Scraper(scraper));
    }

    /// Resolve a tool by identifier, failing fast on unknown names
    pub fn resolve(&self, name: &str) -> AgentResult<ToolHandle> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::config(format!("Unknown tool: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool identifiers, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticSource {
        authed: bool,
    }

    #[async_trait]
    impl DataSourceConnector for StaticSource {
        fn source_name(&self) -> &str {
            "static"
        }

        fn has_credentials(&self) -> bool {
            self.authed
        }

        async fn fetch(&self, _request: &DataSourceRequest) -> Result<Value, ToolFault> {
            Ok(json!({"ok": true}))
        }
    }

    #[test]
    fn resolve_unknown_tool_is_configuration_error() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("semrush").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn connector_without_credentials_is_not_registered() {
        let mut registry = ToolRegistry::new();
        assert!(!registry.register_data_source("ga_connector", Arc::new(StaticSource { authed: false })));
        assert!(registry.register_data_source("search_console", Arc::new(StaticSource { authed: true })));

        assert!(!registry.contains("ga_connector"));
        assert_eq!(registry.names(), vec!["search_console"]);
    }

    #[tokio::test]
    async fn resolved_handle_calls_through() {
        let mut registry = ToolRegistry::new();
        registry.register_data_source("ga_connector", Arc::new(StaticSource { authed: true }));

        match registry.resolve("ga_connector").unwrap() {
            ToolHandle::DataSource(connector) => {
                let value = connector.fetch(&DataSourceRequest::default()).await.unwrap();
                assert_eq!(value["ok"], true);
            }
            other => panic!("unexpected handle {:?}", other),
        }
    }
}

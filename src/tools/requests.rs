use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Arguments passed to a data-source connector
///
/// Every field is optional; a connector uses what applies to it
/// (GA wants `product_id`/`brand`, SEMrush wants `keyword`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceRequest {
    pub product_id: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub product_url: Option<String>,
    pub keyword: Option<String>,
    /// Look-back window in days
    pub days: u32,
}

impl Default for DataSourceRequest {
    fn default() -> Self {
        Self {
            product_id: None,
            brand: None,
            category: None,
            product_url: None,
            keyword: None,
            days: 90,
        }
    }
}

/// Firecrawl operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeAction {
    Search,
    Scrape,
    Extract,
    DeepResearch,
    BatchScrape,
    Map,
    Crawl,
}

impl ScrapeAction {
    /// Name of the MCP tool that serves this action. Extraction runs
    /// through the scrape tool with the `extract` format.
    pub fn mcp_tool_name(&self) -> &'static str {
        match self {
            ScrapeAction::Search => "firecrawl_search",
            ScrapeAction::Scrape | ScrapeAction::Extract => "firecrawl_scrape",
            ScrapeAction::DeepResearch => "firecrawl_deep_research",
            ScrapeAction::BatchScrape => "firecrawl_batch_scrape",
            ScrapeAction::Map => "firecrawl_map",
            ScrapeAction::Crawl => "firecrawl_crawl",
        }
    }
}

impl std::fmt::Display for ScrapeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScrapeAction::Search => "search",
            ScrapeAction::Scrape => "scrape",
            ScrapeAction::Extract => "extract",
            ScrapeAction::DeepResearch => "deep_research",
            ScrapeAction::BatchScrape => "batch_scrape",
            ScrapeAction::Map => "map",
            ScrapeAction::Crawl => "crawl",
        };
        write!(f, "{}", name)
    }
}

/// Arguments passed to a web scraper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub action: ScrapeAction,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub extract_schema: Option<Value>,
}

impl ScrapeRequest {
    pub fn search(query: impl Into<String>, limit: u32) -> Self {
        Self {
            action: ScrapeAction::Search,
            query: Some(query.into()),
            url: None,
            urls: Vec::new(),
            limit: Some(limit),
            extract_schema: None,
        }
    }

    pub fn scrape(url: impl Into<String>) -> Self {
        Self {
            action: ScrapeAction::Scrape,
            query: None,
            url: Some(url.into()),
            urls: Vec::new(),
            limit: None,
            extract_schema: None,
        }
    }

    /// Builds the MCP argument object for this request
    ///
    /// # Returns
    /// * `Err(String)` - When a field required by the action is missing
    pub fn mcp_arguments(&self) -> Result<Value, String> {
        let mut args = Map::new();
        match self.action {
            ScrapeAction::Search | ScrapeAction::DeepResearch => {
                let query = non_empty(&self.query)
                    .ok_or_else(|| format!("Query is required for {} action", self.action))?;
                args.insert("query".into(), json!(query));
                if let (ScrapeAction::Search, Some(limit)) = (self.action, self.limit) {
                    args.insert("limit".into(), json!(limit));
                }
            }
            ScrapeAction::Scrape | ScrapeAction::Map | ScrapeAction::Crawl => {
                let url = non_empty(&self.url)
                    .ok_or_else(|| format!("URL is required for {} action", self.action))?;
                args.insert("url".into(), json!(url));
                if self.action == ScrapeAction::Scrape {
                    if let Some(schema) = &self.extract_schema {
                        args.insert("formats".into(), json!(["extract"]));
                        args.insert("extract".into(), json!({ "schema": schema }));
                    }
                }
            }
            ScrapeAction::Extract => {
                let url = match non_empty(&self.url) {
                    Some(url) => url,
                    None if !self.urls.is_empty() => {
                        return Err(
                            "Batch extraction is not supported by extract; use batch_scrape".into(),
                        )
                    }
                    None => return Err("URL is required for extract action".into()),
                };
                let schema = self
                    .extract_schema
                    .as_ref()
                    .ok_or("extract_schema is required for extract action")?;
                args.insert("url".into(), json!(url));
                args.insert("formats".into(), json!(["extract"]));
                args.insert("extract".into(), json!({ "schema": schema }));
            }
            ScrapeAction::BatchScrape => {
                if self.urls.is_empty() {
                    return Err("URLs are required for batch_scrape action".into());
                }
                args.insert("urls".into(), json!(self.urls));
            }
        }
        Ok(Value::Object(args))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

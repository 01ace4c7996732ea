use async_trait::async_trait;
use serde_json::Value;

use crate::agents::errors::AgentResult;
use crate::agents::workflow::{AgentWorkflow, StepContext, ToolRequirement};
use crate::domain::descriptors::AgentDescriptor;
use crate::tools::{DataSourceRequest, ScrapeRequest};

const REQUEST: &str = "request";
const PAYLOAD: &str = "payload";

/// Search results requested from the crawler per product
pub const CRAWL_RESULT_LIMIT: u32 = 5;

/// Where a data collection agent gets its data from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionSource {
    /// A structured connector (GA, Search Console, SEMrush, Trends, Merchant Center)
    Connector,
    /// The web crawler
    Crawler,
}

#[derive(Debug, Clone)]
enum PreparedRequest {
    Connector(DataSourceRequest),
    Crawler(ScrapeRequest),
}

/// Pulls one source's data for the product and publishes it unchanged
///
/// Three steps: build the request from the seeded product data, call the
/// tool, then check the payload before it is published. A payload carrying
/// an `error` field fails the run.
#[derive(Debug, Clone)]
pub struct DataCollectionWorkflow {
    results_key: String,
    source: CollectionSource,
}

impl DataCollectionWorkflow {
    pub fn new(results_key: impl Into<String>, source: CollectionSource) -> Self {
        Self {
            results_key: results_key.into(),
            source,
        }
    }

    pub fn connector(results_key: impl Into<String>) -> Self {
        Self::new(results_key, CollectionSource::Connector)
    }

    pub fn crawler(results_key: impl Into<String>) -> Self {
        Self::new(results_key, CollectionSource::Crawler)
    }
}

#[async_trait]
impl AgentWorkflow for DataCollectionWorkflow {
    fn plan(&self, agent: &AgentDescriptor) -> Vec<String> {
        let tool = agent
            .tools()
            .first()
            .map(String::as_str)
            .unwrap_or("its tool");
        vec![
            "Build the request from the product data".to_string(),
            format!("Fetch {} via {}", self.results_key, tool),
            format!("Validate and publish {}", self.results_key),
        ]
    }

    fn results_key(&self) -> &str {
        &self.results_key
    }

    fn required_tool(&self) -> Option<ToolRequirement> {
        Some(match self.source {
            CollectionSource::Connector => ToolRequirement::DataSource,
            CollectionSource::Crawler => ToolRequirement::Scraper,
        })
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext) -> AgentResult<()> {
        match index {
            0 => {
                let product = ctx.product();
                if product.is_null() {
                    ctx.note_gap(crate::domain::memory::PRODUCT_DATA_KEY);
                }
                let request = match self.source {
                    CollectionSource::Connector => {
                        PreparedRequest::Connector(connector_request(&product))
                    }
                    CollectionSource::Crawler => {
                        let query = crawl_query(&product)
                            .ok_or_else(|| ctx.fail("product has no brand or title to search for"))?;
                        PreparedRequest::Crawler(ScrapeRequest::search(query, CRAWL_RESULT_LIMIT))
                    }
                };
                ctx.stash(REQUEST, request);
                Ok(())
            }
            1 => {
                let payload = match ctx.take::<PreparedRequest>(REQUEST)? {
                    PreparedRequest::Connector(request) => ctx.fetch(&request).await?,
                    PreparedRequest::Crawler(request) => {
                        request.mcp_arguments().map_err(|e| ctx.fail(e))?;
                        ctx.scrape(&request).await?
                    }
                };
                ctx.stash(PAYLOAD, payload);
                Ok(())
            }
            2 => {
                let payload: Value = ctx.take(PAYLOAD)?;
                if payload.is_null() {
                    return Err(ctx.fail("source returned no data"));
                }
                if let Some(error) = payload.get("error") {
                    let message = error
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string());
                    return Err(ctx.fail(format!("source reported an error: {}", message)));
                }
                ctx.set_results(payload);
                Ok(())
            }
            _ => Err(ctx.fail("no such step")),
        }
    }
}

fn text_field(product: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| product.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Maps the seeded product record onto connector arguments
pub fn connector_request(product: &Value) -> DataSourceRequest {
    let brand = text_field(product, &["brand", "Mærke"]);
    let category = text_field(product, &["category"]);
    let title = text_field(product, &["title", "Produktets titel"]);
    let keyword = text_field(product, &["keyword"]).or_else(|| title.clone()).or_else(|| {
        match (&brand, &category) {
            (Some(brand), Some(category)) => Some(format!("{} {}", brand, category)),
            (Some(brand), None) => Some(brand.clone()),
            _ => None,
        }
    });

    DataSourceRequest {
        product_id: text_field(product, &["product_id", "id", "ean", "EAN nummer"]),
        brand,
        category,
        product_url: text_field(product, &["product_url", "url"]),
        keyword,
        ..DataSourceRequest::default()
    }
}

/// Search query used to find competing pages for the product
pub fn crawl_query(product: &Value) -> Option<String> {
    let brand = text_field(product, &["brand", "Mærke"]);
    let title = text_field(product, &["title", "Produktets titel"]);
    match (brand, title) {
        (Some(brand), Some(title)) if title.to_lowercase().contains(&brand.to_lowercase()) => {
            Some(title)
        }
        (Some(brand), Some(title)) => Some(format!("{} {}", brand, title)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

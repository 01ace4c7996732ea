use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::infrastructure::config::Credentials;
use crate::tools::{DataSourceConnector, DataSourceRequest, ScrapeRequest, ToolFault, WebScraper};

/// Data-source connector that answers from JSON files on disk
///
/// For a tool named `ga_connector` it reads
/// `<dir>/ga_connector/<product_id>.json` when that file exists, else
/// `<dir>/ga_connector.json`. Snapshots answer without authenticating, so
/// the connector is usable whether or not its credentials are set.
#[derive(Debug, Clone)]
pub struct SnapshotConnector {
    tool: String,
    source: String,
    dir: PathBuf,
    credentials: Credentials,
}

impl SnapshotConnector {
    pub fn new(tool: impl Into<String>, source: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            source: source.into(),
            dir: dir.into(),
            credentials: Credentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl DataSourceConnector for SnapshotConnector {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch(&self, request: &DataSourceRequest) -> Result<Value, ToolFault> {
        tracing::debug!(tool = %self.tool, product = ?request.product_id, "Reading connector snapshot");
        read_snapshot(&self.tool, &self.dir, request.product_id.as_deref()).await
    }
}

/// Web scraper that answers from JSON files on disk
///
/// Keyed by the search query (or URL) turned into a file name slug, falling
/// back to `<dir>/<tool>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotScraper {
    tool: String,
    dir: PathBuf,
    credentials: Credentials,
}

impl SnapshotScraper {
    pub fn new(tool: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            dir: dir.into(),
            credentials: Credentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl WebScraper for SnapshotScraper {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Value, ToolFault> {
        let key = request.query.as_deref().or(request.url.as_deref());
        tracing::debug!(tool = %self.tool, action = %request.action, "Reading scraper snapshot");
        read_snapshot(&self.tool, &self.dir, key).await
    }
}

async fn read_snapshot(tool: &str, dir: &Path, key: Option<&str>) -> Result<Value, ToolFault> {
    let keyed = key
        .map(slug)
        .filter(|s| !s.is_empty())
        .map(|s| dir.join(tool).join(format!("{}.json", s)));

    let path = match keyed {
        Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => path,
        _ => dir.join(format!("{}.json", tool)),
    };

    let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
        ToolFault::permanent(tool, format!("no snapshot at {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ToolFault::permanent(tool, format!("snapshot {} is not valid JSON: {}", path.display(), e))
    })
}

/// Lowercase file name for a lookup key; anything but letters and digits
/// becomes a single `-`
pub fn slug(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn slug_is_path_safe() {
        assert_eq!(slug("Nordic Oak Table"), "nordic-oak-table");
        assert_eq!(slug("../../etc/passwd"), "etc-passwd");
        assert_eq!(slug("https://www.example.com/p?id=1"), "https-www-example-com-p-id-1");
    }

    #[tokio::test]
    async fn product_snapshot_wins_over_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("ga_connector")).unwrap();
        fs::write(dir.path().join("ga_connector.json"), r#"{"which": "default"}"#).unwrap();
        fs::write(dir.path().join("ga_connector/sku-1.json"), r#"{"which": "product"}"#).unwrap();
        let connector = SnapshotConnector::new("ga_connector", "google_analytics", dir.path());

        let product = DataSourceRequest {
            product_id: Some("SKU-1".to_string()),
            ..DataSourceRequest::default()
        };
        assert_eq!(connector.fetch(&product).await.unwrap(), json!({"which": "product"}));

        let other = DataSourceRequest {
            product_id: Some("SKU-2".to_string()),
            ..DataSourceRequest::default()
        };
        assert_eq!(connector.fetch(&other).await.unwrap(), json!({"which": "default"}));
    }

    #[tokio::test]
    async fn missing_snapshot_is_a_permanent_fault() {
        let dir = tempfile::tempdir().unwrap();
        let scraper = SnapshotScraper::new("firecrawl", dir.path());

        let fault = scraper
            .scrape(&ScrapeRequest::search("oak table", 5))
            .await
            .unwrap_err();
        assert_eq!(fault.tool, "firecrawl");
        assert!(!fault.retryable);
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("semrush_connector.json"), "{not json").unwrap();
        let connector = SnapshotConnector::new("semrush_connector", "semrush", dir.path());

        let fault = connector.fetch(&DataSourceRequest::default()).await.unwrap_err();
        assert!(fault.message.contains("not valid JSON"));
    }
}

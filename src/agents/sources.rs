//! Typed views of the data-collection payloads published to shared memory
//!
//! Every field is optional or defaulted: a source that omits a section is
//! read as empty, never as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GA_DATA: &str = "ga_data";
pub const SEARCH_CONSOLE_DATA: &str = "search_console_data";
pub const SEMRUSH_DATA: &str = "semrush_data";
pub const TRENDS_DATA: &str = "trends_data";
pub const MERCHANT_CENTER_DATA: &str = "merchant_center_data";
pub const FIRECRAWL_RESULTS: &str = "firecrawl_results";

pub const KEYWORD_ANALYSIS_RESULTS: &str = "keyword_analysis_results";
pub const COMPETITOR_ANALYSIS_RESULTS: &str = "competitor_analysis_results";
pub const CONTENT_OPTIMIZATION_RESULTS: &str = "content_optimization_results";

// ===== Google Analytics =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaData {
    pub performance_metrics: Option<GaPerformance>,
    pub brand_keywords: Option<GaBrandKeywords>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaPerformance {
    pub conversion_metrics: Option<ConversionMetrics>,
    pub seasonal_trends: Option<Seasonality>,
    pub user_segments: Option<UserSegments>,
    pub traffic_patterns: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionMetrics {
    pub conversion_rate: f64,
    pub cart_abandonment_rate: f64,
    pub revenue_per_view: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSegments {
    pub high_value_segments: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaBrandKeywords {
    pub keywords: Vec<GaKeyword>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaKeyword {
    pub term: String,
    pub views: f64,
    pub sessions: f64,
    pub conversions: f64,
    /// Percentage
    pub conversion_rate: f64,
}

/// Seasonality summary, shared by GA and Trends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seasonality {
    pub is_seasonal: bool,
    pub peak_month: Option<String>,
    pub lowest_month: Option<String>,
}

// ===== Search Console =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConsoleData {
    pub search_data: SearchData,
    pub keyword_opportunities: KeywordOpportunities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchData {
    pub query_count: f64,
    pub total_impressions: f64,
    pub total_clicks: f64,
    pub avg_ctr: f64,
    pub avg_position: f64,
    pub dominant_device: Option<String>,
    pub queries: Vec<SearchQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub query: String,
    pub impressions: f64,
    pub clicks: f64,
    /// Percentage
    pub ctr: f64,
    pub avg_position: f64,
    pub dominant_device: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordOpportunities {
    pub high_impression_low_ctr: Vec<LowCtrOpportunity>,
    pub already_ranking: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowCtrOpportunity {
    pub query: String,
    pub impressions: f64,
    pub current_ctr: f64,
    pub potential_clicks: f64,
}

// ===== SEMrush =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemrushData {
    pub keyword: Option<String>,
    pub search_volume: f64,
    pub cpc: f64,
    pub competition: f64,
    pub related_keywords: Vec<SemrushKeyword>,
    pub competitors: Vec<SemrushCompetitor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemrushKeyword {
    pub keyword: String,
    pub search_volume: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemrushCompetitor {
    pub domain: String,
    pub common_keywords: f64,
    pub organic_traffic: f64,
}

// ===== Google Trends =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsData {
    pub related_queries: RelatedQueries,
    pub is_rising: bool,
    pub seasonality: Option<Seasonality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedQueries {
    pub rising: Vec<TrendQuery>,
    pub top: Vec<TrendQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendQuery {
    pub query: String,
    pub value: f64,
}

// ===== Merchant Center =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantCenterData {
    pub product_data: Option<Value>,
    pub product_issues: Option<ProductIssues>,
    pub performance_report: Option<Value>,
    pub price_insights: Option<PriceInsights>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductIssues {
    pub has_critical_issues: bool,
    pub issue_count: f64,
    pub issues: Vec<ProductIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductIssue {
    pub code: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceInsights {
    pub price_competitiveness: Option<PriceCompetitiveness>,
    pub category_price_range: Option<PriceRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceCompetitiveness {
    pub price_benchmark: f64,
    pub product_price: f64,
    pub price_difference: f64,
    /// `above_average`, `average` or `below_average`
    pub relative_position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

// ===== Firecrawl =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirecrawlResults {
    pub query: Option<String>,
    #[serde(alias = "results", alias = "data")]
    pub pages: Vec<CrawlPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlPage {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub price: Option<f64>,
}

impl CrawlPage {
    /// Host part of the page URL, without a leading `www.`
    pub fn domain(&self) -> Option<String> {
        domain_of(&self.url)
    }

    /// Title, description and keywords, lowercased, for text matching
    pub fn text(&self) -> String {
        let mut text = String::new();
        for part in [self.title.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
        {
            text.push_str(part);
            text.push(' ');
        }
        text.push_str(&self.keywords.join(" "));
        text.to_lowercase()
    }
}

/// Extracts the host from an absolute or scheme-less URL
pub fn domain_of(url: &str) -> Option<String> {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let host = rest
        .split(['/', '?', '#'])
        .next()?
        .split(':')
        .next()?
        .trim()
        .to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

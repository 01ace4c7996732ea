use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanEvent;

/// Search intent inferred from a keyword's wording and traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    Informational,
    Navigational,
    Transactional,
    #[default]
    Unknown,
}

impl std::fmt::Display for SearchIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchIntent::Informational => write!(f, "informational"),
            SearchIntent::Navigational => write!(f, "navigational"),
            SearchIntent::Transactional => write!(f, "transactional"),
            SearchIntent::Unknown => write!(f, "unknown"),
        }
    }
}

/// Metrics gathered for a keyword, each taken from the most authoritative
/// source that reported it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordMetrics {
    pub clicks: Option<f64>,
    pub impressions: Option<f64>,
    pub ctr: Option<f64>,
    pub sessions: Option<f64>,
    pub conversions: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub search_volume: Option<f64>,
    pub trend_value: Option<f64>,
}

impl KeywordMetrics {
    /// Fills every empty field from `other`
    pub fn merge_missing(&mut self, other: &KeywordMetrics) {
        fn fill(slot: &mut Option<f64>, value: Option<f64>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.clicks, other.clicks);
        fill(&mut self.impressions, other.impressions);
        fill(&mut self.ctr, other.ctr);
        fill(&mut self.sessions, other.sessions);
        fill(&mut self.conversions, other.conversions);
        fill(&mut self.conversion_rate, other.conversion_rate);
        fill(&mut self.search_volume, other.search_volume);
        fill(&mut self.trend_value, other.trend_value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankedKeyword {
    pub term: String,
    pub score: f64,
    /// Most authoritative source reporting the keyword
    pub source: String,
    pub corroborating_sources: Vec<String>,
    pub verified: bool,
    pub intent: SearchIntent,
    pub metrics: KeywordMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordGroups {
    pub informational: Vec<String>,
    pub navigational: Vec<String>,
    pub transactional: Vec<String>,
    pub unknown: Vec<String>,
}

impl KeywordGroups {
    pub fn group_mut(&mut self, intent: SearchIntent) -> &mut Vec<String> {
        match intent {
            SearchIntent::Informational => &mut self.informational,
            SearchIntent::Navigational => &mut self.navigational,
            SearchIntent::Transactional => &mut self.transactional,
            SearchIntent::Unknown => &mut self.unknown,
        }
    }
}

/// Published under `keyword_analysis_results`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordAnalysisResult {
    pub top_ranked_keywords: Vec<RankedKeyword>,
    pub keyword_groups: KeywordGroups,
    pub recommendations: Vec<String>,
    /// Distinct keywords seen across all sources before truncation
    pub combined_keyword_count: usize,
    pub sources_used: Vec<String>,
    /// Sources that were unavailable when the analysis ran
    pub data_gaps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Competitor {
    pub domain: String,
    pub source: String,
    pub corroborating_sources: Vec<String>,
    pub verified: bool,
    /// Crawled pages seen for this domain
    pub pages: usize,
    pub organic_traffic: Option<f64>,
    pub common_keywords: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSummary {
    /// Keywords used by two or more competitor pages
    pub common_keywords: Vec<String>,
    pub average_description_length: Option<f64>,
    /// Product features no competitor page mentions
    pub unique_features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSummary {
    pub our_price: Option<f64>,
    pub average_competitor_price: Option<f64>,
    pub min_competitor_price: Option<f64>,
    pub max_competitor_price: Option<f64>,
    /// `above_average`, `average` or `below_average`
    pub positioning: Option<String>,
    pub positioning_source: Option<String>,
    pub verified: bool,
}

/// Published under `competitor_analysis_results`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorAnalysisResult {
    pub identified_competitors: Vec<Competitor>,
    pub content_analysis: ContentSummary,
    pub pricing_analysis: PricingSummary,
    pub recommendations: Vec<String>,
    pub sources_used: Vec<String>,
    pub data_gaps: Vec<String>,
}

/// Published under `content_optimization_results`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentOptimizationResult {
    pub primary_keyword: Option<String>,
    pub title_recommendations: Vec<String>,
    pub description_recommendations: Vec<String>,
    pub other_recommendations: Vec<String>,
    pub sources_used: Vec<String>,
    pub data_gaps: Vec<String>,
}

/// How an agent run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed {
        /// Step that was executing, -1 if none had started
        step: i64,
        reason: String,
    },
}

/// Summary of one agent run, returned by the runner and kept in team reports
#[derive(Debug, Clone, Serialize)]
pub struct AgentRunReport {
    pub agent: String,
    pub outcome: RunOutcome,
    /// Shared-memory key the results were written to, if any
    pub results_key: Option<String>,
    pub data_gaps: Vec<String>,
    pub events: Vec<PlanEvent>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AgentRunReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

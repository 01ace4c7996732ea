//! Unified SEO context
//!
//! Folds the final contents of a run's shared memory into the single
//! document handed to downstream content generation.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::agents::sources::{
    GaData, MerchantCenterData, SearchConsoleData, TrendsData, COMPETITOR_ANALYSIS_RESULTS,
    CONTENT_OPTIMIZATION_RESULTS, FIRECRAWL_RESULTS, GA_DATA, KEYWORD_ANALYSIS_RESULTS,
    MERCHANT_CENTER_DATA, SEARCH_CONSOLE_DATA, SEMRUSH_DATA, TRENDS_DATA,
};
use crate::agents::types::{
    CompetitorAnalysisResult, ContentOptimizationResult, KeywordAnalysisResult,
};
use crate::domain::plan::PlanStatusRecord;

/// Keys that count as a source of the context when present
pub const CONTEXT_SOURCES: [&str; 9] = [
    GA_DATA,
    SEARCH_CONSOLE_DATA,
    SEMRUSH_DATA,
    TRENDS_DATA,
    MERCHANT_CENTER_DATA,
    FIRECRAWL_RESULTS,
    KEYWORD_ANALYSIS_RESULTS,
    COMPETITOR_ANALYSIS_RESULTS,
    CONTENT_OPTIMIZATION_RESULTS,
];

const TOP_QUERIES: usize = 5;
const LOW_CTR_OPPORTUNITIES: usize = 3;
const QUALITY_ISSUES: usize = 5;

const PLAN_STATUS_SUFFIX: &str = "_plan_status";

/// Builds `{ product, seo_context }` from the product and the final store
///
/// Sections whose sources never ran are `null` (or empty lists); a source
/// that is present but malformed is treated the same way.
pub fn build_context(product: &Value, memory: &BTreeMap<String, Value>) -> Value {
    let sources_used: Vec<&str> = CONTEXT_SOURCES
        .iter()
        .copied()
        .filter(|key| memory.get(*key).is_some_and(|v| !v.is_null()))
        .collect();

    tracing::debug!(sources = ?sources_used, "Building unified context");

    json!({
        "product": product,
        "seo_context": {
            "sources_used": sources_used,
            "high_value_keywords": high_value_keywords(memory),
            "search_insights": search_insights(memory),
            "competitor_insights": competitor_insights(memory),
            "market_positioning": market_positioning(memory),
            "content_recommendations": content_recommendations(memory),
            "user_segments": user_segments(memory),
            "seasonal_trends": seasonal_trends(memory),
            "data_quality_issues": data_quality_issues(memory),
            "performance_summary": performance_summary(memory),
            "agent_statuses": agent_statuses(memory),
        }
    })
}

fn typed<T: DeserializeOwned>(memory: &BTreeMap<String, Value>, key: &str) -> Option<T> {
    let value = memory.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(typed) => Some(typed),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Skipping malformed entry in context");
            None
        }
    }
}

fn high_value_keywords(memory: &BTreeMap<String, Value>) -> Value {
    let Some(analysis) = typed::<KeywordAnalysisResult>(memory, KEYWORD_ANALYSIS_RESULTS) else {
        return json!([]);
    };
    analysis
        .top_ranked_keywords
        .iter()
        .enumerate()
        .map(|(i, k)| {
            json!({
                "term": k.term,
                "rank": i + 1,
                "score": k.score,
                "source": k.source,
                "verified": k.verified,
                "intent": k.intent,
            })
        })
        .collect()
}

fn search_insights(memory: &BTreeMap<String, Value>) -> Value {
    let Some(sc) = typed::<SearchConsoleData>(memory, SEARCH_CONSOLE_DATA) else {
        return Value::Null;
    };
    let data = &sc.search_data;
    json!({
        "total_impressions": data.total_impressions,
        "total_clicks": data.total_clicks,
        "avg_ctr": data.avg_ctr,
        "avg_position": data.avg_position,
        "dominant_device": data.dominant_device,
        "top_queries": data.queries.iter().take(TOP_QUERIES).collect::<Vec<_>>(),
        "low_ctr_opportunities": sc
            .keyword_opportunities
            .high_impression_low_ctr
            .iter()
            .take(LOW_CTR_OPPORTUNITIES)
            .collect::<Vec<_>>(),
    })
}

fn competitor_insights(memory: &BTreeMap<String, Value>) -> Value {
    let Some(analysis) = typed::<CompetitorAnalysisResult>(memory, COMPETITOR_ANALYSIS_RESULTS)
    else {
        return Value::Null;
    };
    json!({
        "top_competitors": analysis.identified_competitors,
        "common_keywords": analysis.content_analysis.common_keywords,
        "unique_features_vs_competitors": analysis.content_analysis.unique_features,
        "pricing_position": analysis.pricing_analysis.positioning,
    })
}

fn market_positioning(memory: &BTreeMap<String, Value>) -> Value {
    let merchant = typed::<MerchantCenterData>(memory, MERCHANT_CENTER_DATA);
    let prices = merchant.as_ref().and_then(|m| m.price_insights.as_ref());
    let competitors = typed::<CompetitorAnalysisResult>(memory, COMPETITOR_ANALYSIS_RESULTS);
    let pricing = competitors.as_ref().map(|c| &c.pricing_analysis);

    json!({
        "price_position_mc": prices
            .and_then(|p| p.price_competitiveness.as_ref())
            .and_then(|c| c.relative_position.clone()),
        "category_price_range_mc": prices.and_then(|p| p.category_price_range.as_ref()),
        "price_position": pricing.and_then(|p| p.positioning.clone()),
        "price_position_source": pricing.and_then(|p| p.positioning_source.clone()),
        "price_position_verified": pricing.is_some_and(|p| p.verified),
    })
}

fn content_recommendations(memory: &BTreeMap<String, Value>) -> Value {
    let Some(content) = typed::<ContentOptimizationResult>(memory, CONTENT_OPTIMIZATION_RESULTS)
    else {
        return Value::Null;
    };
    json!({
        "primary_keyword": content.primary_keyword,
        "title_suggestions": content.title_recommendations,
        "description_suggestions": content.description_recommendations,
        "other_seo_suggestions": content.other_recommendations,
    })
}

fn user_segments(memory: &BTreeMap<String, Value>) -> Value {
    typed::<GaData>(memory, GA_DATA)
        .and_then(|ga| ga.performance_metrics)
        .and_then(|p| p.user_segments)
        .map(|s| Value::Array(s.high_value_segments))
        .unwrap_or_else(|| json!([]))
}

fn seasonal_trends(memory: &BTreeMap<String, Value>) -> Value {
    let ga = typed::<GaData>(memory, GA_DATA)
        .and_then(|ga| ga.performance_metrics)
        .and_then(|p| p.seasonal_trends);
    let trends = typed::<TrendsData>(memory, TRENDS_DATA).and_then(|t| t.seasonality);

    // GA observed the product itself, so its peak month wins
    let is_seasonal = ga.as_ref().is_some_and(|s| s.is_seasonal)
        || trends.as_ref().is_some_and(|s| s.is_seasonal);
    let peak_month = ga
        .as_ref()
        .and_then(|s| s.peak_month.clone())
        .or_else(|| trends.as_ref().and_then(|s| s.peak_month.clone()));

    json!({
        "is_seasonal": is_seasonal,
        "peak_month": peak_month,
        "trends_data": trends,
    })
}

fn data_quality_issues(memory: &BTreeMap<String, Value>) -> Value {
    let issues = typed::<MerchantCenterData>(memory, MERCHANT_CENTER_DATA)
        .and_then(|m| m.product_issues)
        .map(|p| p.issues)
        .unwrap_or_default();
    issues
        .into_iter()
        .filter(|i| matches!(i.severity.as_deref(), Some("critical" | "error")))
        .take(QUALITY_ISSUES)
        .map(|i| json!(i))
        .collect()
}

fn performance_summary(memory: &BTreeMap<String, Value>) -> Value {
    let ga = typed::<GaData>(memory, GA_DATA)
        .and_then(|ga| ga.performance_metrics)
        .and_then(|p| p.conversion_metrics);
    let mc = typed::<MerchantCenterData>(memory, MERCHANT_CENTER_DATA)
        .and_then(|m| m.performance_report)
        .and_then(|r| r.get("metrics").cloned())
        .unwrap_or(Value::Null);
    let sc = typed::<SearchConsoleData>(memory, SEARCH_CONSOLE_DATA).map(|sc| sc.search_data);

    json!({
        "ga_conversion_rate": ga.as_ref().map(|c| c.conversion_rate),
        "mc_conversion_rate": mc.get("conversion_rate"),
        "mc_ctr": mc.get("ctr"),
        "sc_avg_ctr": sc.as_ref().map(|d| d.avg_ctr),
        "total_impressions_sc": sc.as_ref().map(|d| d.total_impressions),
        "total_clicks_sc": sc.as_ref().map(|d| d.total_clicks),
    })
}

fn agent_statuses(memory: &BTreeMap<String, Value>) -> Value {
    let mut statuses = Map::new();
    for (key, value) in memory {
        let Some(agent) = key.strip_suffix(PLAN_STATUS_SUFFIX) else {
            continue;
        };
        let status = match PlanStatusRecord::from_value(value.clone()) {
            Ok(record) => json!({
                "status": record.status(),
                "current_step_index": record.current_step_index(),
                "error_message": record.error_message(),
            }),
            Err(e) => json!({ "status": "Invalid", "error_message": e.to_string() }),
        };
        statuses.insert(agent.to_string(), status);
    }
    Value::Object(statuses)
}

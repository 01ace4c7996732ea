use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::hierarchy::{Claim, InformationHierarchy};
use crate::agents::sources::{
    domain_of, FirecrawlResults, MerchantCenterData, SemrushData, COMPETITOR_ANALYSIS_RESULTS,
    FIRECRAWL_RESULTS, MERCHANT_CENTER_DATA, SEMRUSH_DATA,
};
use crate::agents::types::{Competitor, CompetitorAnalysisResult, ContentSummary, PricingSummary};
use crate::agents::workflow::{AgentWorkflow, StepContext};
use crate::domain::descriptors::AgentDescriptor;

pub const TOP_COMPETITORS: usize = 5;
const TOP_COMMON_KEYWORDS: usize = 10;

const INPUTS: &str = "inputs";
const COMPETITORS: &str = "competitors";
const ANALYSIS: &str = "analysis";

#[derive(Debug, Clone, Default)]
struct Inputs {
    product: Value,
    crawl: Option<FirecrawlResults>,
    semrush: Option<SemrushData>,
    merchant: Option<MerchantCenterData>,
    sources_used: Vec<String>,
}

/// Identifies competing domains and compares their content and pricing to
/// the product
///
/// Needs crawl results or SEMrush competitor data; Merchant Center price
/// insights are optional and, when present, outrank crawl-derived pricing.
#[derive(Debug, Clone, Default)]
pub struct CompetitorAnalysisWorkflow;

#[async_trait]
impl AgentWorkflow for CompetitorAnalysisWorkflow {
    fn plan(&self, _agent: &AgentDescriptor) -> Vec<String> {
        vec![
            "Gather competitor data from available sources".to_string(),
            "Identify top competitors".to_string(),
            "Analyze competitor content and pricing".to_string(),
            "Write competitor recommendations".to_string(),
        ]
    }

    fn results_key(&self) -> &str {
        COMPETITOR_ANALYSIS_RESULTS
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext) -> AgentResult<()> {
        match index {
            0 => {
                let mut inputs = Inputs {
                    product: ctx.product(),
                    crawl: ctx.optional_as(FIRECRAWL_RESULTS),
                    semrush: ctx.optional_as(SEMRUSH_DATA),
                    merchant: ctx.optional_as(MERCHANT_CENTER_DATA),
                    ..Inputs::default()
                };
                if inputs.crawl.is_none() && inputs.semrush.is_none() {
                    return Err(AgentError::PrerequisiteMissing {
                        agent: ctx.agent_name().to_string(),
                        key: format!("{}|{}", FIRECRAWL_RESULTS, SEMRUSH_DATA),
                    });
                }
                for (key, present) in [
                    (FIRECRAWL_RESULTS, inputs.crawl.is_some()),
                    (SEMRUSH_DATA, inputs.semrush.is_some()),
                    (MERCHANT_CENTER_DATA, inputs.merchant.is_some()),
                ] {
                    if present {
                        inputs.sources_used.push(key.to_string());
                    }
                }
                ctx.stash(INPUTS, inputs);
                Ok(())
            }
            1 => {
                let inputs: Inputs = ctx.take(INPUTS)?;
                let own_domain = product_domain(&inputs.product);
                let competitors = identify_competitors(
                    ctx.hierarchy(),
                    inputs.crawl.as_ref(),
                    inputs.semrush.as_ref(),
                    own_domain.as_deref(),
                );
                ctx.stash(COMPETITORS, competitors);
                ctx.stash(INPUTS, inputs);
                Ok(())
            }
            2 => {
                let inputs: Inputs = ctx.take(INPUTS)?;
                let own_domain = product_domain(&inputs.product);
                let pages = competitor_pages(inputs.crawl.as_ref(), own_domain.as_deref());
                let content = analyze_content(&pages, &product_features(&inputs.product));
                let pricing = analyze_pricing(
                    ctx.hierarchy(),
                    &pages,
                    product_price(&inputs.product),
                    inputs.merchant.as_ref(),
                );
                ctx.stash(ANALYSIS, (content, pricing));
                ctx.stash(INPUTS, inputs);
                Ok(())
            }
            3 => {
                let inputs: Inputs = ctx.take(INPUTS)?;
                let mut competitors: Vec<Competitor> = ctx.take(COMPETITORS)?;
                let (content, pricing): (ContentSummary, PricingSummary) = ctx.take(ANALYSIS)?;

                let recommendations = recommendations(&competitors, &content, &pricing);
                competitors.truncate(TOP_COMPETITORS);

                let result = CompetitorAnalysisResult {
                    identified_competitors: competitors,
                    content_analysis: content,
                    pricing_analysis: pricing,
                    recommendations,
                    sources_used: inputs.sources_used,
                    data_gaps: ctx.data_gaps().to_vec(),
                };
                ctx.set_results_from(&result)
            }
            _ => Err(ctx.fail("no such step")),
        }
    }
}

fn product_domain(product: &Value) -> Option<String> {
    ["product_url", "url"]
        .iter()
        .find_map(|key| product.get(*key).and_then(Value::as_str))
        .and_then(domain_of)
}

fn product_price(product: &Value) -> Option<f64> {
    match product.get("price")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn product_features(product: &Value) -> Vec<String> {
    product
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter_map(Value::as_str)
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn competitor_pages<'a>(
    crawl: Option<&'a FirecrawlResults>,
    own_domain: Option<&str>,
) -> Vec<&'a crate::agents::sources::CrawlPage> {
    crawl
        .map(|c| c.pages.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(|page| page.domain().is_some() && page.domain().as_deref() != own_domain)
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Sighting {
    pages: usize,
    organic_traffic: Option<f64>,
    common_keywords: Option<f64>,
}

/// Competing domains from SEMrush and crawl hosts, attributed through the
/// hierarchy and ordered verified first, then by traffic and page count
pub fn identify_competitors(
    hierarchy: &InformationHierarchy,
    crawl: Option<&FirecrawlResults>,
    semrush: Option<&SemrushData>,
    own_domain: Option<&str>,
) -> Vec<Competitor> {
    let mut by_domain: BTreeMap<String, Vec<Claim<Sighting>>> = BTreeMap::new();

    if let Some(semrush) = semrush {
        for competitor in &semrush.competitors {
            let Some(domain) = domain_of(&competitor.domain) else {
                continue;
            };
            if Some(domain.as_str()) == own_domain {
                continue;
            }
            by_domain.entry(domain).or_default().push(Claim::new(
                SEMRUSH_DATA,
                Sighting {
                    pages: 0,
                    organic_traffic: Some(competitor.organic_traffic),
                    common_keywords: Some(competitor.common_keywords),
                },
            ));
        }
    }

    for page in competitor_pages(crawl, own_domain) {
        if let Some(domain) = page.domain() {
            by_domain.entry(domain).or_default().push(Claim::new(
                FIRECRAWL_RESULTS,
                Sighting {
                    pages: 1,
                    ..Sighting::default()
                },
            ));
        }
    }

    let mut competitors: Vec<Competitor> = by_domain
        .into_iter()
        .filter_map(|(domain, claims)| {
            let resolved = hierarchy.reconcile(&claims)?;
            Some(Competitor {
                domain,
                source: resolved.source,
                corroborating_sources: resolved.corroborating,
                verified: resolved.verified,
                pages: claims.iter().map(|c| c.value.pages).sum(),
                organic_traffic: claims.iter().find_map(|c| c.value.organic_traffic),
                common_keywords: claims.iter().find_map(|c| c.value.common_keywords),
            })
        })
        .collect();

    competitors.sort_by(|a, b| {
        b.verified
            .cmp(&a.verified)
            .then_with(|| {
                b.organic_traffic
                    .unwrap_or(-1.0)
                    .total_cmp(&a.organic_traffic.unwrap_or(-1.0))
            })
            .then_with(|| b.pages.cmp(&a.pages))
            .then_with(|| a.domain.cmp(&b.domain))
    });
    competitors
}

fn analyze_content(pages: &[&crate::agents::sources::CrawlPage], features: &[String]) -> ContentSummary {
    let mut frequency: BTreeMap<String, usize> = BTreeMap::new();
    for page in pages {
        let mut seen: Vec<String> = page
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        seen.sort();
        seen.dedup();
        for keyword in seen {
            *frequency.entry(keyword).or_default() += 1;
        }
    }
    let mut common: Vec<(String, usize)> = frequency.into_iter().filter(|(_, n)| *n >= 2).collect();
    common.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let lengths: Vec<usize> = pages
        .iter()
        .filter_map(|p| p.description.as_deref())
        .map(|d| d.trim().chars().count())
        .filter(|n| *n > 0)
        .collect();
    let average_description_length = if lengths.is_empty() {
        None
    } else {
        Some(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
    };

    let texts: Vec<String> = pages.iter().map(|p| p.text()).collect();
    let unique_features = features
        .iter()
        .filter(|feature| {
            let needle = feature.to_lowercase();
            !texts.iter().any(|text| text.contains(&needle))
        })
        .cloned()
        .collect();

    ContentSummary {
        common_keywords: common
            .into_iter()
            .take(TOP_COMMON_KEYWORDS)
            .map(|(keyword, _)| keyword)
            .collect(),
        average_description_length,
        unique_features,
    }
}

/// Where a price sits relative to a benchmark, with a ±10% band
pub fn relative_position(price: f64, benchmark: f64) -> &'static str {
    if price > benchmark * 1.1 {
        "above_average"
    } else if price < benchmark * 0.9 {
        "below_average"
    } else {
        "average"
    }
}

fn analyze_pricing(
    hierarchy: &InformationHierarchy,
    pages: &[&crate::agents::sources::CrawlPage],
    our_price: Option<f64>,
    merchant: Option<&MerchantCenterData>,
) -> PricingSummary {
    let competitiveness = merchant
        .and_then(|m| m.price_insights.as_ref())
        .and_then(|p| p.price_competitiveness.as_ref());
    let category_range = merchant
        .and_then(|m| m.price_insights.as_ref())
        .and_then(|p| p.category_price_range.as_ref());

    let prices: Vec<f64> = pages
        .iter()
        .filter_map(|p| p.price)
        .filter(|p| *p > 0.0)
        .collect();
    let crawl_average = if prices.is_empty() {
        None
    } else {
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    };

    let our_price = our_price.or_else(|| {
        competitiveness
            .map(|c| c.product_price)
            .filter(|p| *p > 0.0)
    });

    let mut claims = Vec::new();
    if let Some(position) = competitiveness.and_then(|c| c.relative_position.clone()) {
        claims.push(Claim::new(MERCHANT_CENTER_DATA, position));
    }
    if let (Some(ours), Some(average)) = (our_price, crawl_average) {
        claims.push(Claim::new(
            FIRECRAWL_RESULTS,
            relative_position(ours, average).to_string(),
        ));
    }
    let resolved = hierarchy.reconcile(&claims);

    let min = prices.iter().copied().reduce(f64::min);
    let max = prices.iter().copied().reduce(f64::max);

    PricingSummary {
        our_price,
        average_competitor_price: crawl_average
            .or_else(|| competitiveness.map(|c| c.price_benchmark).filter(|p| *p > 0.0)),
        min_competitor_price: min.or_else(|| category_range.map(|r| r.min)),
        max_competitor_price: max.or_else(|| category_range.map(|r| r.max)),
        verified: resolved.as_ref().is_some_and(|r| r.verified),
        positioning_source: resolved.as_ref().map(|r| r.source.clone()),
        positioning: resolved.map(|r| r.value),
    }
}

fn recommendations(
    competitors: &[Competitor],
    content: &ContentSummary,
    pricing: &PricingSummary,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if !content.unique_features.is_empty() {
        recommendations.push(format!(
            "Highlight unique features competitors do not mention: {}",
            content.unique_features.join(", ")
        ));
    } else if !competitors.is_empty() {
        recommendations.push("Highlight unique features mentioned less by competitors.".to_string());
    }

    match pricing.positioning.as_deref() {
        Some("above_average") => recommendations.push(
            "Justify the higher price by emphasizing premium quality or unique features."
                .to_string(),
        ),
        Some("below_average") => recommendations
            .push("Promote the competitive price in the title and description.".to_string()),
        _ => {}
    }

    if !content.common_keywords.is_empty() {
        recommendations.push(format!(
            "Consider incorporating common competitor keywords like: {}",
            content.common_keywords.join(", ")
        ));
    }

    let unverified: Vec<&str> = competitors
        .iter()
        .filter(|c| !c.verified)
        .take(TOP_COMPETITORS)
        .map(|c| c.domain.as_str())
        .collect();
    if !unverified.is_empty() {
        recommendations.push(format!(
            "Confirm crawl-only competitors before benchmarking against them: {}",
            unverified.join(", ")
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::sources::{CrawlPage, PriceCompetitiveness, PriceInsights, SemrushCompetitor};
    use serde_json::json;

    fn page(url: &str, keywords: &[&str], price: Option<f64>) -> CrawlPage {
        CrawlPage {
            url: url.to_string(),
            description: Some("Solid oak dining table".to_string()),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            price,
            ..CrawlPage::default()
        }
    }

    fn crawl() -> FirecrawlResults {
        FirecrawlResults {
            pages: vec![
                page("https://rival.com/a", &["oak table", "dining"], Some(400.0)),
                page("https://other.com/b", &["Oak Table"], Some(600.0)),
                page("https://shop.example.com/p/1", &["oak table"], Some(1.0)),
            ],
            ..FirecrawlResults::default()
        }
    }

    #[test]
    fn own_domain_is_excluded_and_semrush_corroborates_crawl() {
        let semrush = SemrushData {
            competitors: vec![SemrushCompetitor {
                domain: "www.rival.com".to_string(),
                organic_traffic: 5000.0,
                common_keywords: 40.0,
            }],
            ..SemrushData::default()
        };
        let competitors = identify_competitors(
            &InformationHierarchy::standard(),
            Some(&crawl()),
            Some(&semrush),
            Some("shop.example.com"),
        );

        assert_eq!(competitors.len(), 2);
        assert_eq!(competitors[0].domain, "rival.com");
        assert_eq!(competitors[0].source, SEMRUSH_DATA);
        assert_eq!(competitors[0].pages, 1);
        assert!(competitors[0].verified);
        assert_eq!(competitors[1].domain, "other.com");
        assert!(!competitors[1].verified);
    }

    #[test]
    fn common_keywords_need_two_pages() {
        let crawl = crawl();
        let pages = competitor_pages(Some(&crawl), Some("shop.example.com"));
        let content = analyze_content(&pages, &["Oiled finish".to_string(), "Dining".to_string()]);

        assert_eq!(content.common_keywords, vec!["oak table".to_string()]);
        assert_eq!(content.unique_features, vec!["Oiled finish".to_string()]);
        assert_eq!(content.average_description_length, Some(22.0));
    }

    #[test]
    fn merchant_center_position_outranks_crawl() {
        let crawl = crawl();
        let pages = competitor_pages(Some(&crawl), Some("shop.example.com"));
        let merchant = MerchantCenterData {
            price_insights: Some(PriceInsights {
                price_competitiveness: Some(PriceCompetitiveness {
                    price_benchmark: 700.0,
                    product_price: 650.0,
                    relative_position: Some("average".to_string()),
                    ..PriceCompetitiveness::default()
                }),
                category_price_range: None,
            }),
            ..MerchantCenterData::default()
        };

        let pricing = analyze_pricing(&InformationHierarchy::standard(), &pages, Some(650.0), Some(&merchant));
        assert_eq!(pricing.average_competitor_price, Some(500.0));
        assert_eq!(pricing.positioning.as_deref(), Some("average"));
        assert_eq!(pricing.positioning_source.as_deref(), Some(MERCHANT_CENTER_DATA));
        assert!(pricing.verified);
        assert_eq!(pricing.min_competitor_price, Some(400.0));
    }

    #[test]
    fn crawl_only_position_is_unverified() {
        let crawl = crawl();
        let pages = competitor_pages(Some(&crawl), Some("shop.example.com"));
        let pricing = analyze_pricing(&InformationHierarchy::standard(), &pages, Some(650.0), None);

        assert_eq!(pricing.positioning.as_deref(), Some("above_average"));
        assert!(!pricing.verified);
    }

    #[test]
    fn price_reads_numbers_and_strings() {
        assert_eq!(product_price(&json!({"price": 99.5})), Some(99.5));
        assert_eq!(product_price(&json!({"price": "1299,00"})), Some(1299.0));
        assert_eq!(product_price(&json!({})), None);
    }

    #[test]
    fn relative_position_band() {
        assert_eq!(relative_position(111.0, 100.0), "above_average");
        assert_eq!(relative_position(95.0, 100.0), "average");
        assert_eq!(relative_position(80.0, 100.0), "below_average");
    }
}

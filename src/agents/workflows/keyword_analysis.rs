use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::hierarchy::{Claim, InformationHierarchy};
use crate::agents::sources::{
    FirecrawlResults, GaData, SearchConsoleData, SemrushData, TrendsData, FIRECRAWL_RESULTS,
    GA_DATA, KEYWORD_ANALYSIS_RESULTS, SEARCH_CONSOLE_DATA, SEMRUSH_DATA, TRENDS_DATA,
};
use crate::agents::types::{
    KeywordAnalysisResult, KeywordGroups, KeywordMetrics, RankedKeyword, SearchIntent,
};
use crate::agents::workflow::{AgentWorkflow, StepContext};
use crate::domain::descriptors::AgentDescriptor;

/// Keywords kept in the published ranking
pub const TOP_KEYWORDS: usize = 15;
/// Keywords kept per intent group
pub const GROUP_SIZE: usize = 10;

// Whole words only, inflections listed explicitly
const TRANSACTIONAL_WORDS: &[&str] = &[
    "buy", "buying", "price", "prices", "pricing", "discount", "discounts", "discounted",
    "sale", "sales", "shop", "shops", "shopping",
];
const INFORMATIONAL_WORDS: &[&str] = &[
    "how", "what", "why", "guide", "guides", "tutorial", "tutorials",
];
const NAVIGATIONAL_MIN_SESSIONS: f64 = 5.0;

const OBSERVATIONS: &str = "observations";
const SOURCES_USED: &str = "sources_used";
const RANKED: &str = "ranked";
const COMBINED_COUNT: &str = "combined_count";
const GROUPS: &str = "groups";

/// One source's sighting of a keyword
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub term: String,
    pub score: f64,
    pub metrics: KeywordMetrics,
}

/// Combines keywords from every available source into one deduplicated,
/// ranked list
///
/// # Business Rules
/// - A keyword seen by several sources appears once, attributed to its most
///   authoritative source; scores from every sighting are summed
/// - Keywords only found in crawl data stay unverified unless another source
///   reports them too, and rank below every verified keyword
/// - Missing sources are data gaps; the run fails only if none is available
#[derive(Debug, Clone, Default)]
pub struct KeywordAnalysisWorkflow;

#[async_trait]
impl AgentWorkflow for KeywordAnalysisWorkflow {
    fn plan(&self, _agent: &AgentDescriptor) -> Vec<String> {
        vec![
            "Gather keyword data from available sources".to_string(),
            "Reconcile keywords across sources".to_string(),
            "Rank keywords and group them by intent".to_string(),
            "Write keyword recommendations".to_string(),
        ]
    }

    fn results_key(&self) -> &str {
        KEYWORD_ANALYSIS_RESULTS
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext) -> AgentResult<()> {
        match index {
            0 => gather(ctx),
            1 => {
                let observations: Vec<Claim<Observation>> = ctx.take(OBSERVATIONS)?;
                let combined = reconcile_keywords(ctx.hierarchy(), &observations);
                ctx.stash(COMBINED_COUNT, combined.len());
                ctx.stash(RANKED, combined);
                Ok(())
            }
            2 => {
                let mut ranked: Vec<RankedKeyword> = ctx.take(RANKED)?;
                rank_keywords(ctx.hierarchy(), &mut ranked);
                ctx.stash(GROUPS, group_by_intent(&ranked));
                ctx.stash(RANKED, ranked);
                Ok(())
            }
            3 => {
                let mut ranked: Vec<RankedKeyword> = ctx.take(RANKED)?;
                let keyword_groups: KeywordGroups = ctx.take(GROUPS)?;
                let combined_keyword_count: usize = ctx.take(COMBINED_COUNT)?;
                let sources_used: Vec<String> = ctx.take(SOURCES_USED)?;

                let recommendations = recommendations(&ranked);
                ranked.truncate(TOP_KEYWORDS);

                let result = KeywordAnalysisResult {
                    top_ranked_keywords: ranked,
                    keyword_groups,
                    recommendations,
                    combined_keyword_count,
                    sources_used,
                    data_gaps: ctx.data_gaps().to_vec(),
                };
                ctx.set_results_from(&result)
            }
            _ => Err(ctx.fail("no such step")),
        }
    }
}

fn gather(ctx: &mut StepContext) -> AgentResult<()> {
    let mut observations = Vec::new();
    let mut sources_used = Vec::new();

    if let Some(ga) = ctx.optional_as::<GaData>(GA_DATA) {
        sources_used.push(GA_DATA.to_string());
        observations.extend(ga_observations(&ga));
    }
    if let Some(sc) = ctx.optional_as::<SearchConsoleData>(SEARCH_CONSOLE_DATA) {
        sources_used.push(SEARCH_CONSOLE_DATA.to_string());
        observations.extend(search_console_observations(&sc));
    }
    if let Some(semrush) = ctx.optional_as::<SemrushData>(SEMRUSH_DATA) {
        sources_used.push(SEMRUSH_DATA.to_string());
        observations.extend(semrush_observations(&semrush));
    }
    if let Some(trends) = ctx.optional_as::<TrendsData>(TRENDS_DATA) {
        sources_used.push(TRENDS_DATA.to_string());
        observations.extend(trends_observations(&trends));
    }
    if let Some(crawl) = ctx.optional_as::<FirecrawlResults>(FIRECRAWL_RESULTS) {
        sources_used.push(FIRECRAWL_RESULTS.to_string());
        observations.extend(crawl_observations(&crawl));
    }

    if sources_used.is_empty() {
        return Err(AgentError::PrerequisiteMissing {
            agent: ctx.agent_name().to_string(),
            key: [GA_DATA, SEARCH_CONSOLE_DATA, SEMRUSH_DATA, TRENDS_DATA, FIRECRAWL_RESULTS].join("|"),
        });
    }

    tracing::debug!(
        agent = ctx.agent_name(),
        sources = ?sources_used,
        observations = observations.len(),
        "Gathered keyword observations"
    );
    ctx.stash(OBSERVATIONS, observations);
    ctx.stash(SOURCES_USED, sources_used);
    Ok(())
}

fn observation(source: &str, term: &str, score: f64, metrics: KeywordMetrics) -> Option<Claim<Observation>> {
    let term = term.split_whitespace().collect::<Vec<_>>().join(" ");
    if term.is_empty() {
        return None;
    }
    Some(Claim::new(source, Observation { term, score, metrics }))
}

pub fn ga_observations(ga: &GaData) -> Vec<Claim<Observation>> {
    let keywords = ga
        .brand_keywords
        .as_ref()
        .map(|b| b.keywords.as_slice())
        .unwrap_or_default();
    keywords
        .iter()
        .filter_map(|kw| {
            observation(
                GA_DATA,
                &kw.term,
                kw.conversions * 10.0 + kw.sessions,
                KeywordMetrics {
                    sessions: Some(kw.sessions),
                    conversions: Some(kw.conversions),
                    conversion_rate: Some(kw.conversion_rate),
                    ..KeywordMetrics::default()
                },
            )
        })
        .collect()
}

pub fn search_console_observations(sc: &SearchConsoleData) -> Vec<Claim<Observation>> {
    sc.search_data
        .queries
        .iter()
        .filter_map(|q| {
            observation(
                SEARCH_CONSOLE_DATA,
                &q.query,
                q.clicks * 5.0 + q.impressions * 0.1,
                KeywordMetrics {
                    clicks: Some(q.clicks),
                    impressions: Some(q.impressions),
                    ctr: Some(q.ctr),
                    ..KeywordMetrics::default()
                },
            )
        })
        .collect()
}

pub fn semrush_observations(semrush: &SemrushData) -> Vec<Claim<Observation>> {
    let head = semrush
        .keyword
        .as_deref()
        .map(|kw| (kw, semrush.search_volume));
    let related = semrush
        .related_keywords
        .iter()
        .map(|kw| (kw.keyword.as_str(), kw.search_volume));

    head.into_iter()
        .chain(related)
        .filter_map(|(term, volume)| {
            observation(
                SEMRUSH_DATA,
                term,
                volume * 0.01,
                KeywordMetrics {
                    search_volume: Some(volume),
                    ..KeywordMetrics::default()
                },
            )
        })
        .collect()
}

pub fn trends_observations(trends: &TrendsData) -> Vec<Claim<Observation>> {
    let rising = trends.related_queries.rising.iter().map(|q| (q, q.value * 0.5));
    let top = trends.related_queries.top.iter().map(|q| (q, 0.1));

    rising
        .chain(top)
        .filter_map(|(q, score)| {
            observation(
                TRENDS_DATA,
                &q.query,
                score,
                KeywordMetrics {
                    trend_value: Some(q.value),
                    ..KeywordMetrics::default()
                },
            )
        })
        .collect()
}

pub fn crawl_observations(crawl: &FirecrawlResults) -> Vec<Claim<Observation>> {
    crawl
        .pages
        .iter()
        .flat_map(|page| page.keywords.iter())
        .filter_map(|kw| observation(FIRECRAWL_RESULTS, kw, 0.0, KeywordMetrics::default()))
        .collect()
}

/// Deduplicates observations case-insensitively and attributes each keyword
/// to its most authoritative source
pub fn reconcile_keywords(
    hierarchy: &InformationHierarchy,
    observations: &[Claim<Observation>],
) -> Vec<RankedKeyword> {
    let mut by_term: BTreeMap<String, Vec<Claim<Observation>>> = BTreeMap::new();
    for claim in observations {
        by_term
            .entry(claim.value.term.to_lowercase())
            .or_default()
            .push(claim.clone());
    }

    by_term
        .into_values()
        .filter_map(|mut claims| {
            claims.sort_by(|a, b| hierarchy.compare(&a.source, &b.source));
            let resolved = hierarchy.reconcile(&claims)?;

            let mut metrics = KeywordMetrics::default();
            for claim in &claims {
                metrics.merge_missing(&claim.value.metrics);
            }
            let score = claims.iter().map(|c| c.value.score).sum();
            let intent = classify_intent(&resolved.value.term, &metrics);

            Some(RankedKeyword {
                term: resolved.value.term,
                score,
                source: resolved.source,
                corroborating_sources: resolved.corroborating,
                verified: resolved.verified,
                intent,
                metrics,
            })
        })
        .collect()
}

/// Verified keywords first, then by score, then by source authority
pub fn rank_keywords(hierarchy: &InformationHierarchy, keywords: &mut [RankedKeyword]) {
    keywords.sort_by(|a, b| {
        b.verified
            .cmp(&a.verified)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| hierarchy.compare(&a.source, &b.source))
            .then_with(|| a.term.cmp(&b.term))
    });
}

/// Rule-based intent: wording first, then GA session volume
pub fn classify_intent(term: &str, metrics: &KeywordMetrics) -> SearchIntent {
    let term = term.to_lowercase();
    let words: Vec<&str> = term.split(|c: char| !c.is_alphanumeric()).collect();
    let mentions = |vocabulary: &[&str]| words.iter().any(|word| vocabulary.contains(word));

    if mentions(TRANSACTIONAL_WORDS) {
        SearchIntent::Transactional
    } else if mentions(INFORMATIONAL_WORDS) {
        SearchIntent::Informational
    } else if metrics.sessions.unwrap_or(0.0) > NAVIGATIONAL_MIN_SESSIONS {
        SearchIntent::Navigational
    } else {
        SearchIntent::Unknown
    }
}

pub fn group_by_intent(ranked: &[RankedKeyword]) -> KeywordGroups {
    let mut groups = KeywordGroups::default();
    for keyword in ranked {
        let group = groups.group_mut(keyword.intent);
        if group.len() < GROUP_SIZE {
            group.push(keyword.term.clone());
        }
    }
    groups
}

fn recommendations(ranked: &[RankedKeyword]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let top: Vec<&str> = ranked.iter().take(5).map(|k| k.term.as_str()).collect();
    if !top.is_empty() {
        recommendations.push(format!(
            "Prioritize these top keywords in title and description: {}",
            top.join(", ")
        ));
    }

    if ranked
        .iter()
        .take(20)
        .any(|k| k.metrics.ctr.is_some_and(|ctr| ctr < 1.0))
    {
        recommendations.push(
            "Improve meta descriptions and titles for low CTR queries found in Search Console."
                .to_string(),
        );
    }

    let converting: Vec<&str> = ranked
        .iter()
        .take(10)
        .filter(|k| k.metrics.conversion_rate.is_some_and(|rate| rate > 5.0))
        .map(|k| k.term.as_str())
        .collect();
    if !converting.is_empty() {
        recommendations.push(format!(
            "Focus on high-converting keywords from GA: {}",
            converting.join(", ")
        ));
    }

    let unverified: Vec<&str> = ranked
        .iter()
        .filter(|k| !k.verified)
        .take(5)
        .map(|k| k.term.as_str())
        .collect();
    if !unverified.is_empty() {
        recommendations.push(format!(
            "Confirm crawl-only keywords against analytics before targeting them: {}",
            unverified.join(", ")
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::sources::{CrawlPage, GaBrandKeywords, GaKeyword, SearchData, SearchQuery};

    fn ga(terms: &[(&str, f64, f64)]) -> GaData {
        GaData {
            brand_keywords: Some(GaBrandKeywords {
                keywords: terms
                    .iter()
                    .map(|(term, sessions, conversions)| GaKeyword {
                        term: term.to_string(),
                        sessions: *sessions,
                        conversions: *conversions,
                        conversion_rate: if *sessions > 0.0 { conversions / sessions * 100.0 } else { 0.0 },
                        ..GaKeyword::default()
                    })
                    .collect(),
            }),
            ..GaData::default()
        }
    }

    fn crawl(keywords: &[&str]) -> FirecrawlResults {
        FirecrawlResults {
            pages: vec![CrawlPage {
                url: "https://rival.com/table".to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                ..CrawlPage::default()
            }],
            ..FirecrawlResults::default()
        }
    }

    #[test]
    fn duplicate_terms_merge_across_sources() {
        let hierarchy = InformationHierarchy::standard();
        let mut observations = ga_observations(&ga(&[("Oak Table", 10.0, 1.0)]));
        observations.extend(crawl_observations(&crawl(&["oak table", "teak table"])));

        let combined = reconcile_keywords(&hierarchy, &observations);
        assert_eq!(combined.len(), 2);

        let oak = combined.iter().find(|k| k.term == "Oak Table").unwrap();
        assert_eq!(oak.source, GA_DATA);
        assert_eq!(oak.corroborating_sources, vec![FIRECRAWL_RESULTS.to_string()]);
        assert!(oak.verified);
        assert_eq!(oak.score, 20.0);

        let teak = combined.iter().find(|k| k.term == "teak table").unwrap();
        assert!(!teak.verified);
    }

    #[test]
    fn scores_follow_source_weights() {
        let sc = SearchConsoleData {
            search_data: SearchData {
                queries: vec![SearchQuery {
                    query: "oak table".to_string(),
                    clicks: 4.0,
                    impressions: 100.0,
                    ctr: 4.0,
                    ..SearchQuery::default()
                }],
                ..SearchData::default()
            },
            ..SearchConsoleData::default()
        };
        let observations = search_console_observations(&sc);
        assert_eq!(observations[0].value.score, 30.0);
    }

    #[test]
    fn verified_keywords_rank_above_higher_scoring_crawl_terms() {
        let hierarchy = InformationHierarchy::standard();
        let mut keywords = vec![
            RankedKeyword {
                term: "crawl only".to_string(),
                score: 100.0,
                source: FIRECRAWL_RESULTS.to_string(),
                verified: false,
                ..RankedKeyword::default()
            },
            RankedKeyword {
                term: "from analytics".to_string(),
                score: 1.0,
                source: GA_DATA.to_string(),
                verified: true,
                ..RankedKeyword::default()
            },
        ];

        rank_keywords(&hierarchy, &mut keywords);
        assert_eq!(keywords[0].term, "from analytics");
    }

    #[test]
    fn intent_rules() {
        let none = KeywordMetrics::default();
        assert_eq!(classify_intent("buy oak table", &none), SearchIntent::Transactional);
        assert_eq!(classify_intent("oak table shopping", &none), SearchIntent::Transactional);
        assert_eq!(classify_intent("how to oil oak", &none), SearchIntent::Informational);
        assert_eq!(classify_intent("show room", &none), SearchIntent::Unknown);
        assert_eq!(classify_intent("oak table prices", &none), SearchIntent::Transactional);
        assert_eq!(classify_intent("oak table guides", &none), SearchIntent::Informational);
    }

    #[test]
    fn intent_words_must_match_whole_words() {
        let none = KeywordMetrics::default();
        assert_eq!(classify_intent("however oak", &none), SearchIntent::Unknown);
        assert_eq!(classify_intent("whatever table", &none), SearchIntent::Unknown);
        assert_eq!(classify_intent("furniture salesman", &none), SearchIntent::Unknown);
        assert_eq!(classify_intent("buyer reviews", &none), SearchIntent::Unknown);
        assert_eq!(classify_intent("pricey oak table", &none), SearchIntent::Unknown);

        let busy = KeywordMetrics {
            sessions: Some(12.0),
            ..KeywordMetrics::default()
        };
        assert_eq!(classify_intent("nordic oak", &busy), SearchIntent::Navigational);
    }

    #[test]
    fn groups_are_capped() {
        let ranked: Vec<RankedKeyword> = (0..14)
            .map(|i| RankedKeyword {
                term: format!("buy table {}", i),
                intent: SearchIntent::Transactional,
                ..RankedKeyword::default()
            })
            .collect();
        let groups = group_by_intent(&ranked);
        assert_eq!(groups.transactional.len(), GROUP_SIZE);
        assert!(groups.unknown.is_empty());
    }

    #[test]
    fn blank_terms_are_skipped() {
        let observations = crawl_observations(&crawl(&["  ", "oak   table"]));
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value.term, "oak table");
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::agents::errors::AgentResult;
use crate::agents::sources::{
    SearchConsoleData, COMPETITOR_ANALYSIS_RESULTS, CONTENT_OPTIMIZATION_RESULTS, GA_DATA,
    KEYWORD_ANALYSIS_RESULTS, SEARCH_CONSOLE_DATA,
};
use crate::agents::types::{CompetitorAnalysisResult, ContentOptimizationResult, KeywordAnalysisResult};
use crate::agents::workflow::{AgentWorkflow, StepContext};
use crate::domain::descriptors::AgentDescriptor;

const HIGH_CONVERSION_RATE: f64 = 2.0;
const CONTENT_RULES: &str = "content_rules";

const INPUTS: &str = "inputs";
const TITLE: &str = "title";

/// Length and formatting rules from the `content_rules` knowledge section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContentRules {
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub meta_description_min_chars: usize,
    pub meta_description_max_chars: usize,
    pub separators: Vec<String>,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            title_min_chars: 50,
            title_max_chars: 60,
            meta_description_min_chars: 150,
            meta_description_max_chars: 160,
            separators: vec!["|".to_string(), "-".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Inputs {
    product: Value,
    rules: ContentRules,
    keywords: KeywordAnalysisResult,
    competitors: Option<CompetitorAnalysisResult>,
    search_console: Option<SearchConsoleData>,
    sources_used: Vec<String>,
}

/// Turns keyword and competitor findings into title, description and
/// on-page recommendations
///
/// Keyword analysis results are essential; competitor and Search Console
/// data only add recommendations when present.
#[derive(Debug, Clone, Default)]
pub struct ContentOptimizationWorkflow;

#[async_trait]
impl AgentWorkflow for ContentOptimizationWorkflow {
    fn plan(&self, _agent: &AgentDescriptor) -> Vec<String> {
        vec![
            "Gather keyword and competitor analysis results".to_string(),
            "Draft title recommendations".to_string(),
            "Draft description and on-page recommendations".to_string(),
        ]
    }

    fn results_key(&self) -> &str {
        CONTENT_OPTIMIZATION_RESULTS
    }

    async fn run_step(&self, index: usize, ctx: &mut StepContext) -> AgentResult<()> {
        match index {
            0 => {
                let keywords: KeywordAnalysisResult = ctx.require_as(KEYWORD_ANALYSIS_RESULTS)?;
                let mut inputs = Inputs {
                    product: ctx.product(),
                    rules: ctx.knowledge_section(CONTENT_RULES),
                    keywords,
                    competitors: ctx.optional_as(COMPETITOR_ANALYSIS_RESULTS),
                    search_console: ctx.optional_as(SEARCH_CONSOLE_DATA),
                    sources_used: vec![KEYWORD_ANALYSIS_RESULTS.to_string()],
                };
                if inputs.competitors.is_some() {
                    inputs.sources_used.push(COMPETITOR_ANALYSIS_RESULTS.to_string());
                }
                if inputs.search_console.is_some() {
                    inputs.sources_used.push(SEARCH_CONSOLE_DATA.to_string());
                }
                ctx.stash(INPUTS, inputs);
                Ok(())
            }
            1 => {
                let inputs: Inputs = ctx.take(INPUTS)?;
                ctx.stash(TITLE, title_recommendations(&inputs));
                ctx.stash(INPUTS, inputs);
                Ok(())
            }
            2 => {
                let inputs: Inputs = ctx.take(INPUTS)?;
                let title_recommendations: Vec<String> = ctx.take(TITLE)?;

                let result = ContentOptimizationResult {
                    primary_keyword: inputs
                        .keywords
                        .top_ranked_keywords
                        .first()
                        .map(|k| k.term.clone()),
                    title_recommendations,
                    description_recommendations: description_recommendations(&inputs),
                    other_recommendations: other_recommendations(&inputs),
                    sources_used: inputs.sources_used,
                    data_gaps: ctx.data_gaps().to_vec(),
                };
                ctx.set_results_from(&result)
            }
            _ => Err(ctx.fail("no such step")),
        }
    }
}

fn product_text(product: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| product.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn title_recommendations(inputs: &Inputs) -> Vec<String> {
    let mut recs = Vec::new();
    let ranked = &inputs.keywords.top_ranked_keywords;

    if let Some(primary) = ranked.first() {
        recs.push(format!(
            "Include primary keyword '{}' early in the title.",
            primary.term
        ));
    }
    if let Some(brand) = product_text(&inputs.product, &["brand", "Mærke"]) {
        recs.push(format!("Ensure brand name '{}' is present.", brand));
    }

    let converting: Vec<&str> = ranked
        .iter()
        .filter(|k| k.source == GA_DATA)
        .filter(|k| k.metrics.conversion_rate.is_some_and(|r| r > HIGH_CONVERSION_RATE))
        .take(3)
        .map(|k| k.term.as_str())
        .collect();
    if !converting.is_empty() {
        recs.push(format!(
            "Consider incorporating high-converting terms like: {}",
            converting.join(", ")
        ));
    }

    let rules = &inputs.rules;
    match product_text(&inputs.product, &["title", "Produktets titel"]) {
        Some(title) => {
            let length = title.chars().count();
            if !(rules.title_min_chars..=rules.title_max_chars).contains(&length) {
                recs.push(format!(
                    "Current title is {} characters; keep it between {}-{} characters.",
                    length, rules.title_min_chars, rules.title_max_chars
                ));
            }
        }
        None => recs.push(format!(
            "Keep title length between {}-{} characters.",
            rules.title_min_chars, rules.title_max_chars
        )),
    }
    if !rules.separators.is_empty() {
        let separators: Vec<String> = rules.separators.iter().map(|s| format!("'{}'", s)).collect();
        recs.push(format!(
            "Use separators like {} to improve readability.",
            separators.join(" or ")
        ));
    }
    recs
}

fn description_recommendations(inputs: &Inputs) -> Vec<String> {
    let mut recs = vec![format!(
        "Write a compelling meta description ({}-{} characters) including primary keywords.",
        inputs.rules.meta_description_min_chars, inputs.rules.meta_description_max_chars
    )];

    let secondary: Vec<&str> = inputs
        .keywords
        .top_ranked_keywords
        .iter()
        .skip(1)
        .take(3)
        .map(|k| k.term.as_str())
        .collect();
    if !secondary.is_empty() {
        recs.push(format!(
            "Naturally incorporate secondary keywords like: {} in the main description.",
            secondary.join(", ")
        ));
    }

    if let Some(competitors) = &inputs.competitors {
        let features = &competitors.content_analysis.unique_features;
        if !features.is_empty() {
            recs.push(format!(
                "Highlight unique selling points/features: {}",
                features.join(", ")
            ));
        }
    }

    recs.push("Use bullet points or short paragraphs for readability.".to_string());
    recs.push("Include a clear call-to-action (e.g., 'Shop Now', 'Learn More').".to_string());

    if let Some(sc) = &inputs.search_console {
        let queries: Vec<&str> = sc
            .keyword_opportunities
            .high_impression_low_ctr
            .iter()
            .take(3)
            .map(|q| q.query.as_str())
            .collect();
        if !queries.is_empty() {
            recs.push(format!(
                "Address user intent behind low CTR queries like: {}",
                queries.join(", ")
            ));
        }
    }
    recs
}

fn other_recommendations(inputs: &Inputs) -> Vec<String> {
    let mut recs: Vec<String> = [
        "Use primary keywords in H1 and relevant H2 headings.",
        "Optimize image alt text with descriptive keywords.",
        "Ensure fast page load speed.",
        "Implement structured data (Schema.org) for products.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if let Some(competitors) = &inputs.competitors {
        let keywords = &competitors.content_analysis.common_keywords;
        if !keywords.is_empty() {
            let sample: Vec<&str> = keywords.iter().take(5).map(String::as_str).collect();
            recs.push(format!(
                "Review competitor keyword usage for potential ideas: {}",
                sample.join(", ")
            ));
        }
    }
    recs
}

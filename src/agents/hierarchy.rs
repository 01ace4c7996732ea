use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::sources::{
    FIRECRAWL_RESULTS, GA_DATA, MERCHANT_CENTER_DATA, SEARCH_CONSOLE_DATA, SEMRUSH_DATA,
    TRENDS_DATA,
};

/// How trustworthy a source's facts are on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    /// Source-attributed analytics/API data
    Structured,
    /// Unstructured web crawl data; needs corroboration
    Crawl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRank {
    pub key: String,
    pub class: SourceClass,
    pub rank: u32,
}

/// One source's version of a fact
#[derive(Debug, Clone, PartialEq)]
pub struct Claim<T> {
    pub source: String,
    pub value: T,
}

impl<T> Claim<T> {
    pub fn new(source: impl Into<String>, value: T) -> Self {
        Self {
            source: source.into(),
            value,
        }
    }
}

/// Outcome of reconciling several claims about the same fact
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    /// Value from the most authoritative source
    pub value: T,
    pub source: String,
    /// Other sources that reported the same fact, most authoritative first
    pub corroborating: Vec<String>,
    /// True if the winning source is structured, or anyone else agrees
    pub verified: bool,
}

/// Ranking of named shared-memory source keys used to break ties between
/// overlapping facts
///
/// Structured sources always outrank crawl sources; within a class the
/// lower `rank` wins. Keys the hierarchy does not know rank last and are
/// treated like crawl data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InformationHierarchy {
    sources: Vec<SourceRank>,
}

impl Default for InformationHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

impl InformationHierarchy {
    /// Hierarchy with no known sources
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Analytics first, then keyword tools, then Merchant Center, crawl last
    pub fn standard() -> Self {
        Self::empty()
            .with_source(GA_DATA, SourceClass::Structured, 10)
            .with_source(SEARCH_CONSOLE_DATA, SourceClass::Structured, 20)
            .with_source(SEMRUSH_DATA, SourceClass::Structured, 30)
            .with_source(TRENDS_DATA, SourceClass::Structured, 40)
            .with_source(MERCHANT_CENTER_DATA, SourceClass::Structured, 50)
            .with_source(FIRECRAWL_RESULTS, SourceClass::Crawl, 10)
    }

    /// Adds or replaces a source's ranking
    pub fn with_source(mut self, key: impl Into<String>, class: SourceClass, rank: u32) -> Self {
        let key = key.into();
        self.sources.retain(|s| s.key != key);
        self.sources.push(SourceRank { key, class, rank });
        self.sources
            .sort_by(|a, b| Self::sort_key(Some(a)).cmp(&Self::sort_key(Some(b))).then_with(|| a.key.cmp(&b.key)));
        self
    }

    fn sort_key(source: Option<&SourceRank>) -> (u8, u32) {
        match source {
            Some(SourceRank { class: SourceClass::Structured, rank, .. }) => (0, *rank),
            Some(SourceRank { class: SourceClass::Crawl, rank, .. }) => (1, *rank),
            None => (2, u32::MAX),
        }
    }

    fn lookup(&self, key: &str) -> Option<&SourceRank> {
        self.sources.iter().find(|s| s.key == key)
    }

    pub fn class_of(&self, key: &str) -> Option<SourceClass> {
        self.lookup(key).map(|s| s.class)
    }

    pub fn is_structured(&self, key: &str) -> bool {
        self.class_of(key) == Some(SourceClass::Structured)
    }

    /// `Less` when `a` is more authoritative than `b`
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        Self::sort_key(self.lookup(a))
            .cmp(&Self::sort_key(self.lookup(b)))
            .then_with(|| a.cmp(b))
    }

    /// Known source keys, most authoritative first
    pub fn ordered_sources(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.key.as_str()).collect()
    }

    /// Picks the most authoritative claim and records who corroborates it
    ///
    /// Returns `None` for an empty claim list. Several claims from the same
    /// source count once.
    pub fn reconcile<T: Clone>(&self, claims: &[Claim<T>]) -> Option<Resolution<T>> {
        let winner = claims
            .iter()
            .min_by(|a, b| self.compare(&a.source, &b.source))?;

        let mut corroborating: Vec<String> = claims
            .iter()
            .map(|c| c.source.clone())
            .filter(|s| *s != winner.source)
            .collect();
        corroborating.sort_by(|a, b| self.compare(a, b));
        corroborating.dedup();

        let verified = self.is_structured(&winner.source) || !corroborating.is_empty();

        Some(Resolution {
            value: winner.value.clone(),
            source: winner.source.clone(),
            corroborating,
            verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_outranks_crawl() {
        let hierarchy = InformationHierarchy::standard();
        assert_eq!(hierarchy.compare(TRENDS_DATA, FIRECRAWL_RESULTS), Ordering::Less);
        assert_eq!(hierarchy.compare(FIRECRAWL_RESULTS, GA_DATA), Ordering::Greater);
    }

    #[test]
    fn class_beats_rank_number() {
        let hierarchy = InformationHierarchy::standard()
            .with_source(FIRECRAWL_RESULTS, SourceClass::Crawl, 0);
        assert_eq!(hierarchy.compare(MERCHANT_CENTER_DATA, FIRECRAWL_RESULTS), Ordering::Less);
    }

    #[test]
    fn override_reorders_structured_sources() {
        let hierarchy = InformationHierarchy::standard()
            .with_source(SEMRUSH_DATA, SourceClass::Structured, 1);
        assert_eq!(hierarchy.ordered_sources()[0], SEMRUSH_DATA);
        assert_eq!(hierarchy.compare(SEMRUSH_DATA, GA_DATA), Ordering::Less);
    }

    #[test]
    fn unknown_source_ranks_last() {
        let hierarchy = InformationHierarchy::standard();
        assert_eq!(hierarchy.compare("forum_scrape", FIRECRAWL_RESULTS), Ordering::Greater);
        assert_eq!(hierarchy.class_of("forum_scrape"), None);
    }

    #[test]
    fn reconcile_prefers_structured_claim() {
        let hierarchy = InformationHierarchy::standard();
        let claims = vec![
            Claim::new(FIRECRAWL_RESULTS, "above_average"),
            Claim::new(MERCHANT_CENTER_DATA, "average"),
        ];

        let resolved = hierarchy.reconcile(&claims).unwrap();
        assert_eq!(resolved.value, "average");
        assert_eq!(resolved.source, MERCHANT_CENTER_DATA);
        assert_eq!(resolved.corroborating, vec![FIRECRAWL_RESULTS.to_string()]);
        assert!(resolved.verified);
    }

    #[test]
    fn lone_crawl_claim_is_unverified() {
        let hierarchy = InformationHierarchy::standard();
        let resolved = hierarchy
            .reconcile(&[Claim::new(FIRECRAWL_RESULTS, 42)])
            .unwrap();
        assert!(!resolved.verified);
    }

    #[test]
    fn crawl_claims_from_two_sources_corroborate() {
        let hierarchy = InformationHierarchy::standard().with_source("forum_scrape", SourceClass::Crawl, 20);
        let resolved = hierarchy
            .reconcile(&[Claim::new("forum_scrape", 1), Claim::new(FIRECRAWL_RESULTS, 2)])
            .unwrap();

        assert_eq!(resolved.source, FIRECRAWL_RESULTS);
        assert!(resolved.verified);
    }

    #[test]
    fn repeated_claims_from_one_source_do_not_corroborate() {
        let hierarchy = InformationHierarchy::standard();
        let resolved = hierarchy
            .reconcile(&[Claim::new(FIRECRAWL_RESULTS, 1), Claim::new(FIRECRAWL_RESULTS, 2)])
            .unwrap();
        assert!(resolved.corroborating.is_empty());
        assert!(!resolved.verified);
    }

    #[test]
    fn empty_claims_resolve_to_none() {
        let claims: Vec<Claim<u8>> = Vec::new();
        assert!(InformationHierarchy::standard().reconcile(&claims).is_none());
    }
}

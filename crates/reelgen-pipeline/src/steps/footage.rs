//! Footage acquisition: search terms, per-term queries, dedup and fallback.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::collaborators::{FootageSearch, SearchTermGenerator};
use crate::error::{PipelineError, StepResult};
use crate::metrics;

/// Broad terms tried when topic-specific searches yield too little.
pub const FALLBACK_TERMS: [&str; 5] = ["nature", "city", "technology", "abstract", "motion"];

/// Limits for one acquisition.
#[derive(Debug, Clone)]
pub struct FootagePlan {
    /// Search terms requested from (and kept of) the term generator
    pub term_count: usize,
    pub per_term: usize,
    pub per_page: u32,
    pub min_duration: u32,
    /// Fallback runs while fewer unique references than this were found
    pub min_references: usize,
    pub fallback_terms: Vec<String>,
    pub fallback_per_term: usize,
    pub fallback_per_page: u32,
    pub fallback_min_duration: u32,
    /// Fallback stops once this many unique references are held
    pub fallback_target: usize,
}

impl Default for FootagePlan {
    fn default() -> Self {
        Self {
            term_count: 5,
            per_term: 2,
            per_page: 15,
            min_duration: 10,
            min_references: 3,
            fallback_terms: FALLBACK_TERMS.iter().map(|t| t.to_string()).collect(),
            fallback_per_term: 1,
            fallback_per_page: 10,
            fallback_min_duration: 5,
            fallback_target: 5,
        }
    }
}

/// Insertion-ordered set of footage URLs.
#[derive(Debug, Default)]
struct ReferenceSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ReferenceSet {
    fn insert(&mut self, reference: String) -> bool {
        if self.seen.insert(reference.clone()) {
            self.ordered.push(reference);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// Turns a topic and script into a deduplicated list of footage URLs.
#[derive(Clone)]
pub struct FootageAcquisitionStep {
    terms: Arc<dyn SearchTermGenerator>,
    search: Arc<dyn FootageSearch>,
    plan: FootagePlan,
}

impl FootageAcquisitionStep {
    pub fn new(terms: Arc<dyn SearchTermGenerator>, search: Arc<dyn FootageSearch>) -> Self {
        Self {
            terms,
            search,
            plan: FootagePlan::default(),
        }
    }

    pub fn with_plan(mut self, plan: FootagePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn plan(&self) -> &FootagePlan {
        &self.plan
    }

    /// Collect footage references for `topic`.
    ///
    /// Only a failure of the term generator is an error. Failing or empty
    /// searches just contribute nothing, so the result may be short or empty.
    pub async fn acquire(&self, topic: &str, script: &str) -> StepResult<Vec<String>> {
        let terms = self.search_terms(topic, script).await?;
        info!("Searching footage for {} terms: {:?}", terms.len(), terms);

        let mut references = ReferenceSet::default();

        for term in &terms {
            let found = self
                .query(term, self.plan.per_page, self.plan.min_duration)
                .await;
            for url in found.into_iter().take(self.plan.per_term) {
                references.insert(url);
            }
        }

        if references.len() < self.plan.min_references {
            info!(
                "Only {} videos found, trying fallback terms",
                references.len()
            );
            metrics::record_footage_fallback();

            for term in &self.plan.fallback_terms {
                if references.len() >= self.plan.fallback_target {
                    break;
                }
                let found = self
                    .query(
                        term,
                        self.plan.fallback_per_page,
                        self.plan.fallback_min_duration,
                    )
                    .await;
                for url in found.into_iter().take(self.plan.fallback_per_term) {
                    references.insert(url);
                }
            }
        }

        info!("Found {} unique videos", references.len());
        Ok(references.into_vec())
    }

    async fn search_terms(&self, topic: &str, script: &str) -> StepResult<Vec<String>> {
        let raw = self
            .terms
            .search_terms(topic, self.plan.term_count, script)
            .await
            .map_err(PipelineError::into_search_terms)?;

        let mut seen = HashSet::new();
        Ok(raw
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
            .take(self.plan.term_count)
            .collect())
    }

    async fn query(&self, term: &str, per_page: u32, min_duration: u32) -> Vec<String> {
        match self.search.search(term, per_page, min_duration).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Footage search for '{}' failed: {}", term, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedTerms(StepResult<Vec<String>>);

    #[async_trait]
    impl SearchTermGenerator for FixedTerms {
        async fn search_terms(
            &self,
            _topic: &str,
            _count: usize,
            _script: &str,
        ) -> StepResult<Vec<String>> {
            match &self.0 {
                Ok(terms) => Ok(terms.clone()),
                Err(e) => Err(PipelineError::search_terms_failed(e.to_string())),
            }
        }
    }

    /// Returns canned URLs per term and records every query.
    #[derive(Default)]
    struct CannedSearch {
        results: HashMap<String, Vec<String>>,
        failing: Vec<String>,
        queries: Mutex<Vec<(String, u32, u32)>>,
    }

    impl CannedSearch {
        fn with(mut self, term: &str, urls: &[&str]) -> Self {
            self.results
                .insert(term.to_string(), urls.iter().map(|u| u.to_string()).collect());
            self
        }

        fn failing(mut self, term: &str) -> Self {
            self.failing.push(term.to_string());
            self
        }

        fn queried_terms(&self) -> Vec<String> {
            self.queries.lock().unwrap().iter().map(|q| q.0.clone()).collect()
        }
    }

    #[async_trait]
    impl FootageSearch for CannedSearch {
        async fn search(&self, term: &str, per_page: u32, min_duration: u32) -> StepResult<Vec<String>> {
            self.queries
                .lock()
                .unwrap()
                .push((term.to_string(), per_page, min_duration));
            if self.failing.iter().any(|t| t == term) {
                return Err(PipelineError::footage_search_failed("503"));
            }
            Ok(self.results.get(term).cloned().unwrap_or_default())
        }
    }

    fn terms(list: &[&str]) -> Arc<FixedTerms> {
        Arc::new(FixedTerms(Ok(list.iter().map(|t| t.to_string()).collect())))
    }

    #[tokio::test]
    async fn test_takes_two_per_term_and_dedups() {
        let search = Arc::new(
            CannedSearch::default()
                .with("waves", &["u1", "u2", "u3"])
                .with("coral", &["u2", "u4"])
                .with("fish", &["u5"]),
        );
        let step = FootageAcquisitionStep::new(terms(&["waves", "coral", "fish"]), search.clone());

        let found = step.acquire("ocean", "script").await.unwrap();

        assert_eq!(found, vec!["u1", "u2", "u4", "u5"]);
        assert_eq!(search.queried_terms(), vec!["waves", "coral", "fish"]);
        assert!(search
            .queries
            .lock()
            .unwrap()
            .iter()
            .all(|(_, per_page, min)| *per_page == 15 && *min == 10));
    }

    #[tokio::test]
    async fn test_exact_duplicates_removed() {
        let search = Arc::new(
            CannedSearch::default()
                .with("a", &["same", "same"])
                .with("b", &["same", "other"])
                .with("c", &["third"]),
        );
        let step = FootageAcquisitionStep::new(terms(&["a", "b", "c"]), search);

        let found = step.acquire("topic", "script").await.unwrap();

        assert_eq!(found, vec!["same", "other", "third"]);
    }

    #[tokio::test]
    async fn test_empty_terms_fall_back() {
        let search = Arc::new(
            CannedSearch::default()
                .with("nature", &["n1", "n2"])
                .with("technology", &["t1"]),
        );
        let step = FootageAcquisitionStep::new(terms(&["nothing", "here"]), search.clone());

        let found = step.acquire("obscure", "script").await.unwrap();

        assert_eq!(found, vec!["n1", "t1"]);
        assert_eq!(
            search.queried_terms(),
            vec!["nothing", "here", "nature", "city", "technology", "abstract", "motion"]
        );
        let queries = search.queries.lock().unwrap();
        assert!(queries[2..].iter().all(|(_, per_page, min)| *per_page == 10 && *min == 5));
    }

    #[tokio::test]
    async fn test_fallback_stops_at_target() {
        let search = Arc::new(
            CannedSearch::default()
                .with("rare", &["r1", "r2"])
                .with("nature", &["n1"])
                .with("city", &["c1"])
                .with("technology", &["t1"])
                .with("abstract", &["a1"]),
        );
        let step = FootageAcquisitionStep::new(terms(&["rare"]), search.clone());

        let found = step.acquire("topic", "script").await.unwrap();

        assert_eq!(found, vec!["r1", "r2", "n1", "c1", "t1"]);
        assert!(!search.queried_terms().contains(&"abstract".to_string()));
    }

    #[tokio::test]
    async fn test_failing_term_is_skipped() {
        let search = Arc::new(
            CannedSearch::default()
                .failing("broken")
                .with("good", &["g1", "g2"])
                .with("fine", &["f1"]),
        );
        let step = FootageAcquisitionStep::new(terms(&["broken", "good", "fine"]), search);

        let found = step.acquire("topic", "script").await.unwrap();

        assert_eq!(found, vec!["g1", "g2", "f1"]);
    }

    #[tokio::test]
    async fn test_terms_capped_and_cleaned() {
        let search = Arc::new(CannedSearch::default());
        let step = FootageAcquisitionStep::new(
            terms(&["a", " ", "B", "b", "c", "d", "e", "f"]),
            search.clone(),
        );

        step.acquire("topic", "script").await.unwrap();

        let queried = search.queried_terms();
        assert_eq!(&queried[..5], &["a", "B", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_term_generator_failure_is_an_error() {
        let step = FootageAcquisitionStep::new(
            Arc::new(FixedTerms(Err(PipelineError::search_terms_failed("bad json")))),
            Arc::new(CannedSearch::default()),
        );

        let err = step.acquire("topic", "script").await.unwrap_err();
        assert!(matches!(err, PipelineError::SearchTermsFailed(_)));
    }
}

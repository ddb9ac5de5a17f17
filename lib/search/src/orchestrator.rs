//! Search orchestration
//!
//! One request walks `Start -> TranslatorPending -> (Validated | Fallback)
//! -> Ranked -> Done`. The translator is called once, bounded by a timeout
//! and a cancellation token; any failure moves the request to the keyword
//! fallback instead of failing it. A search always returns a ranked list.

use crate::fallback::FallbackCompiler;
use crate::translator::{TranslateError, Translator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wanderx_core::{
    validate, ConstraintSet, Corpus, Destination, FeatureSchema, GeoFilter, MatchAll,
    RawConstraintPayload, SharedCorpus,
};
use wanderx_ranking::{ExplainedResult, Ranker, RankingStats};

/// Default translator timeout
pub const DEFAULT_TRANSLATOR_TIMEOUT: Duration = Duration::from_millis(3000);

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub translator_timeout: Duration,
    /// Result cap applied when the request does not set one
    pub default_limit: Option<usize>,
    /// Embed the full destination record in each result
    pub include_destinations: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            translator_timeout: DEFAULT_TRANSLATOR_TIMEOUT,
            default_limit: None,
            include_destinations: true,
        }
    }
}

/// A search call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    /// Caller constraints; validated and intersected over derived ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<RawConstraintPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<GeoFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_constraints(mut self, constraints: RawConstraintPayload) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_filters(mut self, filters: GeoFilter) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Why the translator path was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Timeout,
    Unreachable,
    MalformedOutput,
    Cancelled,
    NoTranslator,
}

impl From<&TranslateError> for FallbackReason {
    fn from(err: &TranslateError) -> Self {
        match err {
            TranslateError::Timeout => FallbackReason::Timeout,
            TranslateError::Unreachable(_) => FallbackReason::Unreachable,
            TranslateError::MalformedOutput(_) => FallbackReason::MalformedOutput,
        }
    }
}

/// Per-request pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Start,
    TranslatorPending,
    Validated,
    Fallback,
    Ranked,
    Done,
}

impl std::fmt::Display for SearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SearchStage::Start => "start",
            SearchStage::TranslatorPending => "translator_pending",
            SearchStage::Validated => "validated",
            SearchStage::Fallback => "fallback",
            SearchStage::Ranked => "ranked",
            SearchStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Ordered results plus how the constraints were obtained
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ExplainedResult>,
    /// Candidates that passed the geographic pre-filter
    pub total: usize,
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    /// Constraint set the ranking ran with
    pub constraints: ConstraintSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
    pub stats: RankingStats,
}

/// Coordinates translation, validation, fallback and ranking
pub struct SearchOrchestrator {
    schema: Arc<FeatureSchema>,
    corpus: Arc<SharedCorpus>,
    translator: Option<Arc<dyn Translator>>,
    fallback: Arc<FallbackCompiler>,
    ranker: Ranker,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("features", &self.schema.len())
            .field("translator", &self.translator.is_some())
            .field("keywords", &self.fallback.keyword_count())
            .field("config", &self.config)
            .finish()
    }
}

impl SearchOrchestrator {
    /// Create an orchestrator. Without a translator every search takes the
    /// fallback path.
    pub fn new(
        schema: Arc<FeatureSchema>,
        corpus: Arc<SharedCorpus>,
        translator: Option<Arc<dyn Translator>>,
        fallback: Arc<FallbackCompiler>,
        config: SearchConfig,
    ) -> Self {
        let ranker = Ranker::new(schema.clone());
        Self {
            schema,
            corpus,
            translator,
            fallback,
            ranker,
            config,
        }
    }

    /// Replace the default ranker, e.g. to plug in another scorer
    pub fn with_ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn corpus(&self) -> &Arc<SharedCorpus> {
        &self.corpus
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a search to completion
    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        self.search_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run a search; cancelling `cancel` while the translator is pending
    /// switches the request to the fallback path immediately.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> SearchResponse {
        let started = Instant::now();
        let mut stage = SearchStage::Start;
        let corpus = self.corpus.snapshot();

        advance(&mut stage, SearchStage::TranslatorPending);
        let (derived, fallback_reason, matched_keywords) =
            match self.translate(&request.query, cancel).await {
                Ok(raw) => {
                    advance(&mut stage, SearchStage::Validated);
                    (validate(&raw, &self.schema), None, Vec::new())
                }
                Err(reason) => {
                    warn!(?reason, query = %request.query, "Translator unavailable, using keyword fallback");
                    advance(&mut stage, SearchStage::Fallback);
                    let compiled = self.fallback.compile_detailed(&request.query);
                    (
                        validate(&compiled.payload, &self.schema),
                        Some(reason),
                        compiled.matched_keywords,
                    )
                }
            };

        let constraints = match &request.constraints {
            Some(explicit) => derived.merge_explicit(&validate(explicit, &self.schema)),
            None => derived,
        };

        let (results, total, stats) = self.rank(&corpus, &constraints, request);
        advance(&mut stage, SearchStage::Ranked);

        let used_fallback = fallback_reason.is_some();
        advance(&mut stage, SearchStage::Done);
        info!(
            query = %request.query,
            constraint_count = constraints.len(),
            result_count = results.len(),
            used_fallback,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );

        SearchResponse {
            results,
            total,
            used_fallback,
            fallback_reason,
            constraints,
            matched_keywords,
            stats,
        }
    }

    async fn translate(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<RawConstraintPayload, FallbackReason> {
        let Some(translator) = &self.translator else {
            return Err(FallbackReason::NoTranslator);
        };
        if cancel.is_cancelled() {
            return Err(FallbackReason::Cancelled);
        }

        let timeout = self.config.translator_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FallbackReason::Cancelled),
            outcome = tokio::time::timeout(timeout, translator.translate(query, &self.schema, timeout)) => {
                match outcome {
                    Err(_elapsed) => Err(FallbackReason::Timeout),
                    Ok(Ok(raw)) if raw.has_constraint_shape() => Ok(raw),
                    Ok(Ok(_)) => {
                        debug!("Translator output has no usable feature range");
                        Err(FallbackReason::MalformedOutput)
                    }
                    Ok(Err(err)) => {
                        debug!(error = %err, "Translator call failed");
                        Err(FallbackReason::from(&err))
                    }
                }
            }
        }
    }

    fn rank(
        &self,
        corpus: &Corpus,
        constraints: &ConstraintSet,
        request: &SearchRequest,
    ) -> (Vec<ExplainedResult>, usize, RankingStats) {
        let candidates: Vec<&Destination> = match request.filters.as_ref().filter(|f| !f.is_empty()) {
            Some(filter) => corpus.filtered(filter).collect(),
            None => corpus.filtered(&MatchAll).collect(),
        };
        let total = candidates.len();

        let mut ranked = self.ranker.rank(candidates, constraints);
        if let Some(limit) = request.limit.or(self.config.default_limit) {
            ranked.truncate(limit);
        }

        let stats = RankingStats::compute(&ranked, total);
        let results = ExplainedResult::from_ranked_list(ranked, self.config.include_destinations);
        (results, total, stats)
    }
}

fn advance(stage: &mut SearchStage, next: SearchStage) {
    debug!(from = %stage, to = %next, "Search stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::KeywordTable;
    use async_trait::async_trait;
    use serde_json::json;
    use wanderx_core::{Continent, FeatureRange, FeatureVector};

    struct CannedTranslator(serde_json::Value);

    #[async_trait]
    impl Translator for CannedTranslator {
        async fn translate(
            &self,
            _query: &str,
            _schema: &FeatureSchema,
            _timeout: Duration,
        ) -> Result<RawConstraintPayload, TranslateError> {
            RawConstraintPayload::from_value(self.0.clone())
                .ok_or_else(|| TranslateError::MalformedOutput("not an object".to_string()))
        }
    }

    struct SlowTranslator;

    #[async_trait]
    impl Translator for SlowTranslator {
        async fn translate(
            &self,
            _query: &str,
            _schema: &FeatureSchema,
            _timeout: Duration,
        ) -> Result<RawConstraintPayload, TranslateError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(RawConstraintPayload::new())
        }
    }

    struct DownTranslator;

    #[async_trait]
    impl Translator for DownTranslator {
        async fn translate(
            &self,
            _query: &str,
            _schema: &FeatureSchema,
            _timeout: Duration,
        ) -> Result<RawConstraintPayload, TranslateError> {
            Err(TranslateError::Unreachable("connection refused".to_string()))
        }
    }

    fn destination(id: &str, continent: Continent, popularity: f64, values: &[(&str, f64)]) -> Destination {
        let features: FeatureVector = values.iter().map(|(k, v)| (*k, *v)).collect();
        Destination::new(id, id, "X", continent, features).with_popularity(popularity)
    }

    fn orchestrator(translator: Option<Arc<dyn Translator>>) -> SearchOrchestrator {
        let schema = Arc::new(FeatureSchema::travel_default());
        let corpus = Corpus::new(
            vec![
                destination("a", Continent::Europe, 0.2, &[("avg_temp_c", 0.6), ("tourism_density", 0.1)]),
                destination("b", Continent::Asia, 0.9, &[("avg_temp_c", 0.95), ("tourism_density", 0.9)]),
                destination("c", Continent::Europe, 0.5, &[("avg_temp_c", 0.3), ("tourism_density", 0.2)]),
            ],
            &schema,
        )
        .unwrap();
        let fallback = Arc::new(FallbackCompiler::new(&KeywordTable::builtin(), schema.clone()));
        let config = SearchConfig {
            translator_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        SearchOrchestrator::new(schema, Arc::new(SharedCorpus::new(corpus)), translator, fallback, config)
    }

    fn ids(response: &SearchResponse) -> Vec<&str> {
        response.results.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_translator_path() {
        let translator: Arc<dyn Translator> = Arc::new(CannedTranslator(json!({
            "avg_temp_c": {"min": 0.5, "max": 0.8},
            "tourism_density": {"max": 0.3}
        })));
        let response = orchestrator(Some(translator)).search(&SearchRequest::new("warm and quiet")).await;

        assert!(!response.used_fallback);
        assert!(response.fallback_reason.is_none());
        assert_eq!(ids(&response)[0], "a");
        assert_eq!(response.results[0].score, 0.0);
        assert_eq!(response.total, 3);
        assert_eq!(response.constraints.len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let response = orchestrator(Some(Arc::new(SlowTranslator)))
            .search(&SearchRequest::new("beach"))
            .await;

        assert!(response.used_fallback);
        assert_eq!(response.fallback_reason, Some(FallbackReason::Timeout));
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.matched_keywords, vec!["beach"]);
    }

    #[tokio::test]
    async fn test_unreachable_falls_back() {
        let response = orchestrator(Some(Arc::new(DownTranslator)))
            .search(&SearchRequest::new("quiet"))
            .await;
        assert!(response.used_fallback);
        assert_eq!(response.fallback_reason, Some(FallbackReason::Unreachable));
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let translator: Arc<dyn Translator> = Arc::new(CannedTranslator(json!(["not", "an", "object"])));
        let response = orchestrator(Some(translator)).search(&SearchRequest::new("quiet")).await;
        assert_eq!(response.fallback_reason, Some(FallbackReason::MalformedOutput));
    }

    #[tokio::test]
    async fn test_wrong_shape_falls_back() {
        let translator: Arc<dyn Translator> = Arc::new(CannedTranslator(json!({
            "avg_temp_c": "warm",
            "tourism_density": "low"
        })));
        let response = orchestrator(Some(translator)).search(&SearchRequest::new("quiet")).await;

        assert!(response.used_fallback);
        assert_eq!(response.fallback_reason, Some(FallbackReason::MalformedOutput));
        assert_eq!(response.matched_keywords, vec!["quiet"]);
        assert!(response.constraints.get("tourism_density").is_some());
    }

    #[tokio::test]
    async fn test_cancellation_falls_back() {
        let orchestrator = orchestrator(Some(Arc::new(SlowTranslator)));
        let token = CancellationToken::new();
        token.cancel();

        let response = orchestrator
            .search_with_cancel(&SearchRequest::new("quiet"), &token)
            .await;
        assert_eq!(response.fallback_reason, Some(FallbackReason::Cancelled));
        assert_eq!(response.results.len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_while_pending() {
        let orchestrator = SearchOrchestrator {
            config: SearchConfig {
                translator_timeout: Duration::from_secs(60),
                ..Default::default()
            },
            ..orchestrator(Some(Arc::new(SlowTranslator)))
        };
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let response = orchestrator
            .search_with_cancel(&SearchRequest::new("quiet"), &token)
            .await;
        assert_eq!(response.fallback_reason, Some(FallbackReason::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_neutral_ranking_without_signal() {
        let response = orchestrator(Some(Arc::new(CannedTranslator(json!({})))))
            .search(&SearchRequest::new("anything"))
            .await;
        assert!(response.constraints.is_empty());
        assert!(response.results.iter().all(|r| r.score == 0.0));
        assert_eq!(ids(&response), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_no_translator_uses_fallback() {
        let response = orchestrator(None).search(&SearchRequest::new("nothing matches here")).await;
        assert_eq!(response.fallback_reason, Some(FallbackReason::NoTranslator));
        assert!(response.constraints.is_empty());
        assert_eq!(ids(&response), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_explicit_constraints_take_precedence() {
        let translator: Arc<dyn Translator> = Arc::new(CannedTranslator(json!({"avg_temp_c": {"min": 0.8}})));
        let request = SearchRequest::new("hot").with_constraints(
            RawConstraintPayload::from_value(json!({"avg_temp_c": {"max": 0.4}, "foo": {"max": 1}})).unwrap(),
        );
        let response = orchestrator(Some(translator)).search(&request).await;

        assert_eq!(response.constraints.len(), 1);
        assert_eq!(
            response.constraints.get("avg_temp_c"),
            Some(&FeatureRange { min: 0.0, max: 0.4 })
        );
        assert_eq!(ids(&response)[0], "c");
    }

    #[tokio::test]
    async fn test_geo_filter_and_limit() {
        let request = SearchRequest::new("")
            .with_filters(GeoFilter {
                continent: Some("Europe".to_string()),
                ..Default::default()
            })
            .with_limit(1);
        let response = orchestrator(None).search(&request).await;

        assert_eq!(response.total, 2);
        assert_eq!(ids(&response), vec!["c"]);
        assert_eq!(response.stats.results_count, 1);
        assert_eq!(response.stats.candidates_count, 2);
    }

    #[tokio::test]
    async fn test_blank_filter_keeps_every_candidate() {
        let request = SearchRequest::new("").with_filters(GeoFilter::default());
        let response = orchestrator(None).search(&request).await;

        assert_eq!(response.total, 3);
        assert_eq!(response.stats.candidates_count, 3);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let orchestrator = orchestrator(None);
        let schema = orchestrator.schema().clone();
        orchestrator.corpus().replace(
            Corpus::new(vec![destination("z", Continent::Africa, 0.1, &[])], &schema).unwrap(),
        );
        let response = orchestrator.search(&SearchRequest::new("")).await;
        assert_eq!(ids(&response), vec!["z"]);
    }
}

//! Ranking engine
//!
//! Scores every candidate destination against a validated constraint set
//! and orders them best match first. Ordering is fully deterministic:
//! score ascending, then popularity descending, then id ascending.

use crate::scorer::{BoundaryPenaltyScorer, Scorer};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use wanderx_core::{ConstraintSet, Destination, FeatureSchema};

/// Scores closer than this are treated as equal and fall through to the
/// tie-break.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Candidate count above which scoring is spread over the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// A scored destination borrowed from the corpus
#[derive(Debug, Clone)]
pub struct RankedResult<'a> {
    pub destination: &'a Destination,
    /// Aggregate score, `0.0` is a perfect match
    pub score: f64,
    /// 1-based position in the ordering
    pub rank: usize,
    /// Per-feature penalties for every active constraint
    pub penalties: BTreeMap<String, f64>,
}

impl RankedResult<'_> {
    pub fn id(&self) -> &str {
        &self.destination.id
    }

    pub fn to_scored(&self) -> ScoredResult {
        ScoredResult {
            destination_id: self.destination.id.clone(),
            score: self.score,
            rank: self.rank,
        }
    }
}

/// Owned `(destination id, score, rank)` triple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub destination_id: String,
    pub score: f64,
    pub rank: usize,
}

/// Ranks candidates using a pluggable [`Scorer`]
#[derive(Clone)]
pub struct Ranker {
    schema: Arc<FeatureSchema>,
    scorer: Arc<dyn Scorer>,
    parallel_threshold: usize,
}

impl std::fmt::Debug for Ranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ranker")
            .field("features", &self.schema.len())
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

impl Ranker {
    /// Create a ranker using the boundary-violation scorer
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self::with_scorer(schema, Arc::new(BoundaryPenaltyScorer))
    }

    pub fn with_scorer(schema: Arc<FeatureSchema>, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            schema,
            scorer,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the candidate count from which scoring runs in parallel
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Score and order `candidates`.
    ///
    /// # Arguments
    /// * `candidates` - Destinations that passed any pre-filter
    /// * `constraints` - Validated constraint set, possibly empty
    ///
    /// # Returns
    /// All candidates, best match first, with 1-based ranks
    pub fn rank<'a, I>(&self, candidates: I, constraints: &ConstraintSet) -> Vec<RankedResult<'a>>
    where
        I: IntoIterator<Item = &'a Destination>,
    {
        let candidates: Vec<&'a Destination> = candidates.into_iter().collect();
        let score_one = |destination: &'a Destination| {
            let breakdown = self.scorer.score(destination, constraints, &self.schema);
            RankedResult {
                destination,
                score: crate::penalty::sanitise(breakdown.score),
                rank: 0,
                penalties: breakdown.penalties,
            }
        };

        // per-candidate results are independent; ordering is decided by the
        // sort below, so the parallel collect needs no shared accumulator
        let mut results: Vec<RankedResult<'a>> = if candidates.len() >= self.parallel_threshold {
            candidates.into_par_iter().map(score_one).collect()
        } else {
            candidates.into_iter().map(score_one).collect()
        };

        results.sort_by(compare_results);
        for (i, result) in results.iter_mut().enumerate() {
            result.rank = i + 1;
        }

        debug!(
            candidates = results.len(),
            constraints = constraints.len(),
            "Ranked candidates"
        );
        results
    }
}

/// Scores bucketed to [`SCORE_EPSILON`] so the comparison stays a total order.
fn score_bucket(score: f64) -> u64 {
    (score / SCORE_EPSILON).round() as u64
}

fn compare_results(a: &RankedResult<'_>, b: &RankedResult<'_>) -> Ordering {
    score_bucket(a.score)
        .cmp(&score_bucket(b.score))
        .then_with(|| {
            b.destination
                .popularity_proxy()
                .total_cmp(&a.destination.popularity_proxy())
        })
        .then_with(|| a.destination.id.cmp(&b.destination.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use wanderx_core::{validate, Continent, FeatureVector, RawConstraintPayload};

    fn destination(id: &str, popularity: f64, values: &[(&str, f64)]) -> Destination {
        let features: FeatureVector = values.iter().map(|(k, v)| (*k, *v)).collect();
        Destination::new(id, id, "X", Continent::Europe, features).with_popularity(popularity)
    }

    fn constraints(value: serde_json::Value) -> ConstraintSet {
        let schema = FeatureSchema::travel_default();
        validate(&RawConstraintPayload::from_value(value).unwrap(), &schema)
    }

    fn ranker() -> Ranker {
        Ranker::new(Arc::new(FeatureSchema::travel_default()))
    }

    #[test]
    fn test_best_match_first() {
        let corpus = vec![
            destination("b", 0.9, &[("avg_temp_c", 0.95), ("tourism_density", 0.9)]),
            destination("a", 0.1, &[("avg_temp_c", 0.6), ("tourism_density", 0.1)]),
        ];
        let set = constraints(json!({
            "avg_temp_c": {"min": 0.5, "max": 0.8},
            "tourism_density": {"max": 0.3}
        }));

        let results = ranker().rank(&corpus, &set);
        assert_eq!(results[0].id(), "a");
        assert_eq!(results[0].score, 0.0);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].id(), "b");
        assert!((results[1].score - 0.375).abs() < 1e-9);
        assert_eq!(results[1].rank, 2);
    }

    #[test]
    fn test_neutral_ranking_uses_tie_break() {
        let corpus = vec![
            destination("c", 0.5, &[]),
            destination("a", 0.5, &[]),
            destination("b", 0.9, &[]),
        ];

        let results = ranker().rank(&corpus, &ConstraintSet::empty());
        let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_near_equal_scores_tie() {
        let set = constraints(json!({"avg_temp_c": {"max": 0.5}}));
        let corpus = vec![
            destination("x", 0.1, &[("avg_temp_c", 0.7)]),
            destination("y", 0.8, &[("avg_temp_c", 0.7 + 1e-12)]),
        ];
        let results = ranker().rank(&corpus, &set);
        assert_eq!(results[0].id(), "y");
    }

    #[test]
    fn test_empty_corpus() {
        let corpus: Vec<Destination> = Vec::new();
        assert!(ranker().rank(&corpus, &ConstraintSet::empty()).is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let set = constraints(json!({
            "avg_temp_c": {"min": 0.4, "max": 0.6},
            "nightlife_density": {"min": 0.7}
        }));
        let corpus: Vec<Destination> = (0..200)
            .map(|i| {
                let t = (i * 37 % 100) as f64 / 100.0;
                let n = (i * 53 % 100) as f64 / 100.0;
                destination(&format!("d{i:03}"), (i % 7) as f64 / 7.0, &[("avg_temp_c", t), ("nightlife_density", n)])
            })
            .collect();

        let sequential = ranker().parallel_threshold(usize::MAX).rank(&corpus, &set);
        let parallel = ranker().parallel_threshold(1).rank(&corpus, &set);

        let seq_ids: Vec<&str> = sequential.iter().map(|r| r.id()).collect();
        let par_ids: Vec<&str> = parallel.iter().map(|r| r.id()).collect();
        assert_eq!(seq_ids, par_ids);
    }

    #[test]
    fn test_to_scored() {
        let corpus = vec![destination("a", 0.1, &[])];
        let results = ranker().rank(&corpus, &ConstraintSet::empty());
        assert_eq!(
            results[0].to_scored(),
            ScoredResult {
                destination_id: "a".to_string(),
                score: 0.0,
                rank: 1
            }
        );
    }

    proptest! {
        #[test]
        fn scores_stay_in_unit_interval(
            temp in 0.0f64..=1.0,
            density in 0.0f64..=1.0,
            min in -1.0f64..2.0,
            max in -1.0f64..2.0,
        ) {
            let set = constraints(json!({
                "avg_temp_c": {"min": min, "max": max},
                "elevation": {"max": 0.2}
            }));
            let corpus = vec![destination("p", 0.0, &[("avg_temp_c", temp), ("tourism_density", density)])];
            for result in ranker().rank(&corpus, &set) {
                prop_assert!(result.score >= 0.0 && result.score <= 1.0);
            }
        }

        #[test]
        fn widening_never_increases_penalty(
            value in 0.0f64..=1.0,
            min in 0.0f64..=1.0,
            width in 0.0f64..=1.0,
            grow_low in 0.0f64..=0.5,
            grow_high in 0.0f64..=0.5,
        ) {
            let max = (min + width).min(1.0);
            let narrow = constraints(json!({"avg_temp_c": {"min": min, "max": max}}));
            let wide = constraints(json!({"avg_temp_c": {"min": min - grow_low, "max": max + grow_high}}));
            let corpus = vec![destination("p", 0.0, &[("avg_temp_c", value)])];

            let narrow_penalty = ranker().rank(&corpus, &narrow)[0]
                .penalties.get("avg_temp_c").copied().unwrap_or(0.0);
            let wide_penalty = ranker().rank(&corpus, &wide)[0]
                .penalties.get("avg_temp_c").copied().unwrap_or(0.0);
            prop_assert!(wide_penalty <= narrow_penalty + 1e-12);
        }

        #[test]
        fn ranking_is_repeatable(seed in 0u64..1000) {
            let corpus: Vec<Destination> = (0..30)
                .map(|i| {
                    let v = ((seed + i * 13) % 10) as f64 / 10.0;
                    destination(&format!("d{i}"), (i % 3) as f64, &[("avg_temp_c", v)])
                })
                .collect();
            let set = constraints(json!({"avg_temp_c": {"min": 0.3, "max": 0.5}}));
            let first: Vec<String> = ranker().rank(&corpus, &set).iter().map(|r| r.id().to_string()).collect();
            let second: Vec<String> = ranker().rank(&corpus, &set).iter().map(|r| r.id().to_string()).collect();
            prop_assert_eq!(first, second);
        }
    }
}

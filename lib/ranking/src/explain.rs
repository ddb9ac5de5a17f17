//! Explainability for ranked results
//!
//! Provides output structures that show how each score was computed:
//! per-feature penalties plus summary statistics over a ranking.

use crate::rank::RankedResult;
use serde::Serialize;
use std::collections::BTreeMap;
use wanderx_core::Destination;

/// A ranked destination with its per-feature penalty breakdown
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedResult {
    pub id: String,
    /// 1-based rank
    pub rank: usize,
    /// Aggregate score, `0.0` is a perfect match
    pub score: f64,
    /// Full destination record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    /// Penalty per active constraint
    pub explain: BTreeMap<String, f64>,
}

impl ExplainedResult {
    /// Create an explained result from a ranked result
    pub fn from_ranked(ranked: RankedResult<'_>, include_destination: bool) -> Self {
        Self {
            id: ranked.destination.id.clone(),
            rank: ranked.rank,
            score: ranked.score,
            destination: include_destination.then(|| ranked.destination.clone()),
            explain: ranked.penalties,
        }
    }

    pub fn from_ranked_list(ranked_list: Vec<RankedResult<'_>>, include_destination: bool) -> Vec<Self> {
        ranked_list
            .into_iter()
            .map(|r| Self::from_ranked(r, include_destination))
            .collect()
    }
}

/// Summary statistics for a ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingStats {
    /// Number of destinations that were scored
    pub candidates_count: usize,
    /// Number of results returned
    pub results_count: usize,
    /// Mean score of returned results
    pub mean_score: f64,
    /// Score of the best result
    pub best_score: f64,
    /// Feature with the highest penalty in the best result
    pub worst_feature: Option<String>,
}

impl RankingStats {
    /// Compute stats from sorted results
    pub fn compute(results: &[RankedResult<'_>], candidates_count: usize) -> Self {
        let Some(best) = results.first() else {
            return Self {
                candidates_count,
                results_count: 0,
                mean_score: 0.0,
                best_score: 0.0,
                worst_feature: None,
            };
        };

        let mean_score = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;

        let worst_feature = best
            .penalties
            .iter()
            .filter(|(_, penalty)| **penalty > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(feature, _)| feature.clone());

        Self {
            candidates_count,
            results_count: results.len(),
            mean_score,
            best_score: best.score,
            worst_feature,
        }
    }
}

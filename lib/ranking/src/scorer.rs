//! Scoring seam
//!
//! A [`Scorer`] turns one destination and a validated constraint set into a
//! score in `[0, 1]` (lower is better) plus the per-feature penalties that
//! produced it. The ranker only talks to this trait, so an alternative
//! scoring function can be swapped in without touching validation, the
//! corpus or the orchestrator.

use crate::penalty::{mean_penalty, range_penalty};
use std::collections::BTreeMap;
use wanderx_core::{ConstraintSet, Destination, FeatureSchema};

/// Score of a single destination with its per-feature breakdown
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreBreakdown {
    /// Aggregate score, `0.0` is a perfect match
    pub score: f64,
    /// Penalty per active constraint, keyed by feature name
    pub penalties: BTreeMap<String, f64>,
}

/// Compute a destination's score against a constraint set.
///
/// Implementations must be pure and thread-safe: the ranker may call them
/// from several threads at once. Scores must be finite and in `[0, 1]`.
pub trait Scorer: Send + Sync {
    fn score(
        &self,
        destination: &Destination,
        constraints: &ConstraintSet,
        schema: &FeatureSchema,
    ) -> ScoreBreakdown;
}

/// Mean boundary-violation penalty over the active constraints.
///
/// With no active constraints every destination scores `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryPenaltyScorer;

impl Scorer for BoundaryPenaltyScorer {
    fn score(
        &self,
        destination: &Destination,
        constraints: &ConstraintSet,
        schema: &FeatureSchema,
    ) -> ScoreBreakdown {
        let penalties: BTreeMap<String, f64> = constraints
            .iter()
            .map(|(feature, range)| {
                // validated sets only hold known features, so span is always present
                let span = schema.span_of(feature).unwrap_or(1.0);
                let penalty = range_penalty(destination.features.get(feature), range, span);
                (feature.to_string(), penalty)
            })
            .collect();

        ScoreBreakdown {
            score: mean_penalty(penalties.values().copied()),
            penalties,
        }
    }
}

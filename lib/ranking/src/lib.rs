//! # wanderx Ranking
//!
//! Constraint-driven ranking engine for destination feature vectors.
//!
//! ## Features
//!
//! - **Boundary-violation penalties**: zero inside the requested range, normalized overshoot outside
//! - **Pluggable scoring**: the [`Scorer`] trait is the only thing the ranker calls
//! - **Deterministic ordering**: score, then popularity, then id
//! - **Explainability**: per-feature penalty breakdown for every result
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use wanderx_core::{validate, Continent, Destination, FeatureSchema, FeatureVector, RawConstraintPayload};
//! use wanderx_ranking::Ranker;
//!
//! let schema = Arc::new(FeatureSchema::travel_default());
//! let raw = RawConstraintPayload::from_value(json!({"tourism_density": {"max": 0.3}})).unwrap();
//! let constraints = validate(&raw, &schema);
//!
//! let quiet: FeatureVector = [("tourism_density", 0.1)].into_iter().collect();
//! let busy: FeatureVector = [("tourism_density", 0.9)].into_iter().collect();
//! let corpus = vec![
//!     Destination::new("venice", "Venice", "Italy", Continent::Europe, busy),
//!     Destination::new("matera", "Matera", "Italy", Continent::Europe, quiet),
//! ];
//!
//! let ranked = Ranker::new(schema).rank(&corpus, &constraints);
//! assert_eq!(ranked[0].id(), "matera");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Constraint  │────>│   Scorer    │────>│   Ranker    │
//! │    Set      │     │ (penalties) │     │   (sort)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                         ┌─────────────┐
//!                                         │  Explain    │
//!                                         │  (results)  │
//!                                         └─────────────┘
//! ```

pub mod penalty;
pub mod scorer;
pub mod rank;
pub mod explain;

pub use penalty::{mean_penalty, range_penalty, MISSING_VALUE_PENALTY};
pub use scorer::{BoundaryPenaltyScorer, ScoreBreakdown, Scorer};
pub use rank::{RankedResult, Ranker, ScoredResult, DEFAULT_PARALLEL_THRESHOLD, SCORE_EPSILON};
pub use explain::{ExplainedResult, RankingStats};

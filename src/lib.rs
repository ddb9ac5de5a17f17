//! # wanderx
//!
//! Natural-language search over a corpus of travel destinations.
//!
//! A free-text wish such as "warm but not too hot, few tourists" is turned
//! into numeric range constraints over normalized destination features,
//! either by an external semantic translator (an LLM behind HTTP) or, when
//! that is slow or unavailable, by a deterministic keyword table. Every
//! destination is then scored by how far it falls outside those ranges and
//! the corpus is returned best-first with a per-feature explanation.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! wanderx --corpus destinations.json --http-port 8080 \
//!     --translator-url https://api.openai.com/v1/chat/completions
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wanderx::prelude::*;
//!
//! # async fn run(destinations: Vec<Destination>) -> anyhow::Result<()> {
//! let schema = Arc::new(FeatureSchema::travel_default());
//! let corpus = Arc::new(SharedCorpus::new(Corpus::new(destinations, &schema)?));
//! let fallback = Arc::new(FallbackCompiler::new(&KeywordTable::builtin(), schema.clone()));
//!
//! // no translator: every search is answered from the keyword table
//! let orchestrator = SearchOrchestrator::new(schema, corpus, None, fallback, SearchConfig::default());
//! let response = orchestrator.search(&SearchRequest::new("warm beach, low tourists")).await;
//! for result in &response.results {
//!     println!("{} {} {:.3}", result.rank, result.id, result.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`wanderx-core`](https://docs.rs/wanderx-core) - schema, destinations, corpus, constraint validation
//! - [`wanderx-ranking`](https://docs.rs/wanderx-ranking) - boundary-penalty scoring and deterministic ordering
//! - [`wanderx-search`](https://docs.rs/wanderx-search) - translator seam, keyword fallback, orchestrator
//! - [`wanderx-storage`](https://docs.rs/wanderx-storage) - JSON loaders and corpus reload
//! - [`wanderx-api`](https://docs.rs/wanderx-api) - REST API

// Re-export core types
pub use wanderx_core::{
    validate, ConstraintSet, Continent, Corpus, Destination, Error, FeatureRange, FeatureSchema,
    FeatureSpec, FeatureVector, GeoFilter, RawConstraintPayload, Result, SharedCorpus,
};

// Re-export ranking
pub use wanderx_ranking::{BoundaryPenaltyScorer, ExplainedResult, Ranker, RankingStats, Scorer};

// Re-export search
pub use wanderx_search::{
    CancellationToken, FallbackCompiler, FallbackReason, KeywordTable, LlmTranslator,
    SearchConfig, SearchOrchestrator, SearchRequest, SearchResponse, TranslateError, Translator,
};

// Re-export storage
pub use wanderx_storage::{load_keyword_table, load_schema, CorpusLoader, JsonCorpusLoader};

// Re-export API
pub use wanderx_api::{AppState, RestApi, RestConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        validate, BoundaryPenaltyScorer, ConstraintSet, Corpus, Destination, FallbackCompiler,
        FeatureSchema, GeoFilter, KeywordTable, Ranker, RawConstraintPayload, SearchConfig,
        SearchOrchestrator, SearchRequest, SearchResponse, SharedCorpus, Translator,
    };
}

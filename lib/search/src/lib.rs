//! # wanderx Search
//!
//! Turns free text into ranked destinations.
//!
//! - [`Translator`] - seam to the external semantic translator, with [`LlmTranslator`] as the HTTP implementation
//! - [`FallbackCompiler`] - keyword-driven constraints when the translator is unavailable
//! - [`SearchOrchestrator`] - translator call, validation, fallback decision, ranking
//!
//! ```text
//! query ──> Translator ──ok──> validate ──┐
//!              │                          ├──> merge explicit ──> geo filter ──> Ranker ──> response
//!              └─timeout/error──> Fallback ┘
//! ```

pub mod translator;
pub mod llm;
pub mod fallback;
pub mod orchestrator;

pub use translator::{TranslateError, Translator};
pub use llm::{LlmTranslator, LlmTranslatorBuilder};
pub use fallback::{FallbackCompilation, FallbackCompiler, KeywordRange, KeywordTable};
pub use orchestrator::{
    FallbackReason, SearchConfig, SearchOrchestrator, SearchRequest, SearchResponse, SearchStage,
    DEFAULT_TRANSLATOR_TIMEOUT,
};
pub use tokio_util::sync::CancellationToken;

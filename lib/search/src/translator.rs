//! Semantic translator seam
//!
//! The translator turns free text into an untrusted constraint payload. It
//! is an external collaborator (usually an LLM); the orchestrator only
//! depends on this trait, always calls it with an explicit timeout and
//! cancels it by dropping the future.

use async_trait::async_trait;
use std::time::Duration;
use wanderx_core::{FeatureSchema, RawConstraintPayload};

/// Ways a translator call can fail
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("Translator timed out")]
    Timeout,

    #[error("Translator unreachable: {0}")]
    Unreachable(String),

    #[error("Translator returned malformed output: {0}")]
    MalformedOutput(String),
}

/// Free text to raw constraints.
///
/// Implementations should honor `timeout` themselves where they can; the
/// orchestrator enforces it independently and drops the future when it
/// expires or the request is cancelled.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        query: &str,
        schema: &FeatureSchema,
        timeout: Duration,
    ) -> Result<RawConstraintPayload, TranslateError>;
}

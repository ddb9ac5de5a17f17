//! Startup configuration files
//!
//! The feature schema and the fallback keyword table are optional JSON
//! files; without them the built-in travel schema and vibe table are used.
//! Any file that is given but unreadable or invalid stops startup.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use wanderx_core::FeatureSchema;
use wanderx_search::KeywordTable;

/// Load the feature schema from `path`, or the built-in travel schema.
///
/// # Arguments
/// * `path` - JSON file shaped `{"features": {"name": {"domain": [lo, hi], ...}}}`
///
/// # Returns
/// The validated schema; a domain with `lo >= hi` is an error
pub fn load_schema(path: Option<&Path>) -> Result<FeatureSchema> {
    let Some(path) = path else {
        return Ok(FeatureSchema::travel_default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let schema: FeatureSchema = serde_json::from_str(&text)
        .with_context(|| format!("invalid schema {}", path.display()))?;

    info!(path = %path.display(), features = schema.len(), "Schema loaded");
    Ok(schema)
}

/// Load the fallback keyword table from `path`, or the built-in table.
pub fn load_keyword_table(path: Option<&Path>) -> Result<KeywordTable> {
    let Some(path) = path else {
        return Ok(KeywordTable::builtin());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read keyword table {}", path.display()))?;
    let table: KeywordTable = serde_json::from_str(&text)
        .with_context(|| format!("invalid keyword table {}", path.display()))?;

    info!(path = %path.display(), keywords = table.len(), "Keyword table loaded");
    Ok(table)
}

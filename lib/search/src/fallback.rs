//! Keyword fallback compiler
//!
//! Used when the semantic translator is unavailable or untrustworthy. Known
//! keywords (vibes) are matched against the query and their constraint
//! fragments are combined into a raw payload, which then goes through the
//! same validator as translator output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use wanderx_core::{FeatureSchema, RawConstraintPayload};

/// A keyword's bound on one feature
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Declarative keyword table: keyword or phrase -> feature -> range
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordTable(BTreeMap<String, BTreeMap<String, KeywordRange>>);

impl KeywordTable {
    pub fn new(entries: BTreeMap<String, BTreeMap<String, KeywordRange>>) -> Self {
        Self(entries)
    }

    /// Built-in vibe table over the default travel schema
    pub fn builtin() -> Self {
        let lo = |max: f64| KeywordRange { min: None, max: Some(max) };
        let hi = |min: f64| KeywordRange { min: Some(min), max: None };
        let between = |min: f64, max: f64| KeywordRange { min: Some(min), max: Some(max) };

        let vibes: Vec<(&str, Vec<(&str, KeywordRange)>)> = vec![
            ("chill", vec![("tourism_density", lo(0.4)), ("nightlife_density", lo(0.4)), ("population_density", lo(0.5))]),
            ("relaxing", vec![("tourism_density", lo(0.5)), ("nightlife_density", lo(0.4))]),
            ("quiet", vec![("tourism_density", lo(0.3)), ("nightlife_density", lo(0.3)), ("population", lo(0.4))]),
            ("low tourists", vec![("tourism_density", lo(0.3))]),
            ("few tourists", vec![("tourism_density", lo(0.3))]),
            ("off the beaten path", vec![("tourism_density", lo(0.25)), ("wikipedia_pageviews", lo(0.5))]),
            ("hidden gem", vec![("tourism_density", lo(0.3)), ("wikipedia_pageviews", lo(0.5))]),
            ("remote", vec![("population_density", lo(0.2)), ("tourism_density", lo(0.3))]),
            ("beach", vec![("coast_distance_km", lo(0.05)), ("water_sports_score", hi(0.5))]),
            ("coastal", vec![("coast_distance_km", lo(0.1))]),
            ("seaside", vec![("coast_distance_km", lo(0.1))]),
            ("island", vec![("coast_distance_km", lo(0.05))]),
            ("surf", vec![("water_sports_score", hi(0.7)), ("coast_distance_km", lo(0.1))]),
            ("surfing", vec![("water_sports_score", hi(0.7)), ("coast_distance_km", lo(0.1))]),
            ("diving", vec![("water_sports_score", hi(0.7)), ("coast_distance_km", lo(0.1))]),
            ("water sports", vec![("water_sports_score", hi(0.7))]),
            ("warm", vec![("avg_temp_c", hi(0.6))]),
            ("hot", vec![("avg_temp_c", hi(0.72))]),
            ("not too hot", vec![("avg_temp_c", lo(0.7))]),
            ("mild", vec![("avg_temp_c", between(0.45, 0.65))]),
            ("cold", vec![("avg_temp_c", lo(0.35))]),
            ("not too cold", vec![("avg_temp_c", hi(0.4))]),
            ("tropical", vec![("avg_temp_c", hi(0.7)), ("coast_distance_km", lo(0.2))]),
            ("snow", vec![("avg_temp_c", lo(0.4)), ("skiing_score", hi(0.4))]),
            ("ski", vec![("skiing_score", hi(0.6))]),
            ("skiing", vec![("skiing_score", hi(0.6))]),
            ("hiking", vec![("hiking_score", hi(0.6))]),
            ("trekking", vec![("hiking_score", hi(0.6))]),
            ("mountain", vec![("elevation", hi(0.5)), ("hiking_score", hi(0.4))]),
            ("mountains", vec![("elevation", hi(0.5)), ("hiking_score", hi(0.4))]),
            ("nature", vec![("nature_ratio", hi(0.6))]),
            ("adventure", vec![("hiking_score", hi(0.5)), ("nature_ratio", hi(0.5))]),
            ("wildlife", vec![("wildlife_score", hi(0.6))]),
            ("safari", vec![("wildlife_score", hi(0.7))]),
            ("nightlife", vec![("nightlife_density", hi(0.7))]),
            ("party", vec![("nightlife_density", hi(0.7))]),
            ("city", vec![("population", hi(0.5)), ("population_density", hi(0.5))]),
            ("urban", vec![("population", hi(0.5)), ("population_density", hi(0.5))]),
            ("big city", vec![("population", hi(0.75))]),
            ("popular", vec![("wikipedia_pageviews", hi(0.7))]),
            ("famous", vec![("wikipedia_pageviews", hi(0.7))]),
            ("culture", vec![("wikipedia_pageviews", hi(0.5)), ("tourism_density", hi(0.4))]),
            ("history", vec![("wikipedia_pageviews", hi(0.5)), ("tourism_density", hi(0.4))]),
            ("luxury", vec![("development_level", hi(0.7)), ("gdp_per_capita", hi(0.6))]),
            ("budget", vec![("gdp_per_capita", lo(0.4))]),
            ("cheap", vec![("gdp_per_capita", lo(0.4))]),
            ("affordable", vec![("gdp_per_capita", lo(0.45))]),
        ];

        Self(
            vibes
                .into_iter()
                .map(|(keyword, ranges)| {
                    let ranges = ranges
                        .into_iter()
                        .map(|(feature, range)| (feature.to_string(), range))
                        .collect();
                    (keyword.to_string(), ranges)
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Lowercase and split on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
struct CompiledKeyword {
    phrase: String,
    tokens: Vec<String>,
    ranges: Vec<(String, KeywordRange)>,
}

/// Result of compiling a query through the keyword table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FallbackCompilation {
    pub payload: RawConstraintPayload,
    /// Keywords that contributed, in table order
    pub matched_keywords: Vec<String>,
}

/// Keyword-driven constraint synthesis
#[derive(Debug, Clone)]
pub struct FallbackCompiler {
    keywords: Vec<CompiledKeyword>,
}

impl FallbackCompiler {
    /// Compile the table against the schema.
    ///
    /// Constraints on features the schema does not know and keywords without
    /// any tokens are discarded with a warning.
    pub fn new(table: &KeywordTable, schema: Arc<FeatureSchema>) -> Self {
        let mut keywords = Vec::with_capacity(table.len());

        for (phrase, ranges) in &table.0 {
            let tokens = tokenize(phrase);
            if tokens.is_empty() {
                warn!(keyword = %phrase, "Ignoring keyword without searchable tokens");
                continue;
            }

            let ranges: Vec<(String, KeywordRange)> = ranges
                .iter()
                .filter(|(feature, _)| {
                    let known = schema.is_known(feature);
                    if !known {
                        warn!(keyword = %phrase, feature = %feature, "Ignoring keyword constraint on unknown feature");
                    }
                    known
                })
                .map(|(feature, range)| (feature.clone(), *range))
                .collect();

            keywords.push(CompiledKeyword {
                phrase: phrase.clone(),
                tokens,
                ranges,
            });
        }

        Self { keywords }
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Raw payload for `query`; empty when no keyword matches.
    pub fn compile(&self, query: &str) -> RawConstraintPayload {
        self.compile_detailed(query).payload
    }

    pub fn compile_detailed(&self, query: &str) -> FallbackCompilation {
        let matched = self.find_matches(&tokenize(query));

        let mut merged: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
        for keyword in &matched {
            for (feature, range) in &keyword.ranges {
                let entry = merged.entry(feature.as_str()).or_insert((None, None));
                entry.0 = tighter(entry.0, range.min, f64::max);
                entry.1 = tighter(entry.1, range.max, f64::min);
            }
        }

        let mut payload = RawConstraintPayload::new();
        for (feature, (min, max)) in merged {
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    debug!(feature, min, max, "Dropping contradictory keyword constraints");
                    continue;
                }
            }
            payload.insert(feature, min, max);
        }

        let matched_keywords: Vec<String> = matched.iter().map(|k| k.phrase.clone()).collect();
        debug!(keywords = ?matched_keywords, features = payload.len(), "Fallback compiled query");

        FallbackCompilation {
            payload,
            matched_keywords,
        }
    }

    /// Keywords whose token sequence occurs in the query. Overlapping
    /// occurrences go to the longest keyword.
    fn find_matches(&self, query_tokens: &[String]) -> Vec<&CompiledKeyword> {
        let mut occurrences: Vec<(usize, usize, usize)> = Vec::new();
        for (index, keyword) in self.keywords.iter().enumerate() {
            let len = keyword.tokens.len();
            if len > query_tokens.len() {
                continue;
            }
            for start in 0..=query_tokens.len() - len {
                if query_tokens[start..start + len] == keyword.tokens[..] {
                    occurrences.push((start, len, index));
                }
            }
        }

        occurrences.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)).then(a.2.cmp(&b.2)));

        let mut taken = vec![false; query_tokens.len()];
        let mut accepted = vec![false; self.keywords.len()];
        for (start, len, index) in occurrences {
            if taken[start..start + len].iter().any(|&t| t) {
                continue;
            }
            taken[start..start + len].iter_mut().for_each(|t| *t = true);
            accepted[index] = true;
        }

        self.keywords
            .iter()
            .zip(accepted)
            .filter_map(|(keyword, hit)| hit.then_some(keyword))
            .collect()
    }
}

fn tighter(current: Option<f64>, next: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (current, next) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

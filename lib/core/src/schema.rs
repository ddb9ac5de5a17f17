//! Feature schema definitions
//!
//! Declares which destination features exist, the numeric domain each one
//! lives in and, where it means something, which direction is "better".
//! The schema is built once at startup and shared read-only by every
//! request; construction rejects any domain with `lo >= hi`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Immutable feature schema.
///
/// Features are kept in a `BTreeMap` so iteration (and therefore the
/// rendered description handed to the translator) is always sorted by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct FeatureSchema {
    version: u32,
    features: BTreeMap<String, FeatureSpec>,
}

/// On-disk representation, validated into a [`FeatureSchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    #[serde(default = "default_version")]
    version: u32,
    features: BTreeMap<String, FeatureSpec>,
}

fn default_version() -> u32 {
    1
}

impl TryFrom<SchemaDocument> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(doc: SchemaDocument) -> Result<Self, Self::Error> {
        let mut schema = FeatureSchema::new(doc.features)?;
        schema.version = doc.version;
        Ok(schema)
    }
}

impl From<FeatureSchema> for SchemaDocument {
    fn from(schema: FeatureSchema) -> Self {
        Self {
            version: schema.version,
            features: schema.features,
        }
    }
}

impl FeatureSchema {
    /// Build a schema, failing fast on any invalid domain.
    pub fn new(features: BTreeMap<String, FeatureSpec>) -> Result<Self, SchemaError> {
        if features.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        for (name, spec) in &features {
            if name.trim().is_empty() {
                return Err(SchemaError::EmptyFeatureName);
            }
            let (lo, hi) = spec.domain;
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SchemaError::NonFiniteDomain(name.clone()));
            }
            if lo >= hi {
                return Err(SchemaError::InvalidDomain {
                    feature: name.clone(),
                    lo,
                    hi,
                });
            }
        }

        Ok(Self {
            version: 1,
            features,
        })
    }

    /// The built-in travel schema: sixteen features normalized into `[0, 1]`
    /// by the ingestion pipeline.
    pub fn travel_default() -> Self {
        let unit = |description: &str, higher_is_better: Option<bool>| FeatureSpec {
            domain: (0.0, 1.0),
            higher_is_better,
            description: description.to_string(),
        };

        let features: BTreeMap<String, FeatureSpec> = [
            ("avg_temp_c", unit("Average temperature, linear from -15C (0) to 45C (1); 0.5 is about 15C, 0.75 about 30C", None)),
            ("tourism_density", unit("Density of tourist attractions and visitors; 0 = untouristed, 1 = very crowded", None)),
            ("wikipedia_pageviews", unit("Global fame, log-scaled Wikipedia pageviews; 0 = obscure, 1 = world famous", None)),
            ("accommodation_density", unit("Density of hotels and other lodging", None)),
            ("population", unit("Population size; 0 = village, 1 = megacity", None)),
            ("population_density", unit("People per square km; 0 = empty countryside, 1 = dense urban core", None)),
            ("coast_distance_km", unit("Distance to the sea, linear from 0km (0) to 500km or more (1); low values are coastal", None)),
            ("nature_ratio", unit("Share of surrounding land that is natural (forest, parks, water)", None)),
            ("elevation", unit("Elevation above sea level; high values are mountainous", None)),
            ("skiing_score", unit("Availability of skiing and winter sports", Some(true))),
            ("water_sports_score", unit("Availability of beaches and water sports", Some(true))),
            ("hiking_score", unit("Availability of hiking trails", Some(true))),
            ("wildlife_score", unit("Opportunities to see wildlife", Some(true))),
            ("nightlife_density", unit("Density of bars, clubs and nightlife; 0 = quiet evenings, 1 = party hub", None)),
            ("development_level", unit("Infrastructure and economic development level", None)),
            ("gdp_per_capita", unit("Relative cost and wealth level; low values are budget friendly", None)),
        ]
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect();

        Self {
            version: 1,
            features,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether `feature` is declared in this schema.
    pub fn is_known(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    /// The `(lo, hi)` domain of a known feature.
    pub fn domain_of(&self, feature: &str) -> Option<(f64, f64)> {
        self.features.get(feature).map(|spec| spec.domain)
    }

    /// Width of the domain of a known feature. Always strictly positive.
    pub fn span_of(&self, feature: &str) -> Option<f64> {
        self.domain_of(feature).map(|(lo, hi)| hi - lo)
    }

    pub fn polarity(&self, feature: &str) -> Option<Polarity> {
        self.features.get(feature).map(FeatureSpec::polarity)
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureSpec> {
        self.features.get(feature)
    }

    /// Feature names in sorted order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureSpec)> {
        self.features.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Render the schema as plain text for the semantic translator prompt.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (name, spec) in &self.features {
            let (lo, hi) = spec.domain;
            let _ = write!(out, "- {name} [{lo}, {hi}]");
            match spec.polarity() {
                Polarity::HigherIsBetter => out.push_str(" (higher is better)"),
                Polarity::LowerIsBetter => out.push_str(" (lower is better)"),
                Polarity::Neutral => {}
            }
            if !spec.description.is_empty() {
                let _ = write!(out, ": {}", spec.description);
            }
            out.push('\n');
        }
        out
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::travel_default()
    }
}

/// Declaration of a single feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSpec {
    /// Inclusive `[lo, hi]` domain, serialized as a two-element array.
    pub domain: (f64, f64),

    /// `true` / `false` when the feature has a direction, absent when neutral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub higher_is_better: Option<bool>,

    /// Human description, forwarded to the translator.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FeatureSpec {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self {
            domain: (lo, hi),
            higher_is_better: None,
            description: String::new(),
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self.higher_is_better {
            Some(true) => Polarity::HigherIsBetter,
            Some(false) => Polarity::LowerIsBetter,
            None => Polarity::Neutral,
        }
    }
}

/// Direction in which a feature is preferable, if any.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    LowerIsBetter,
    HigherIsBetter,
    Neutral,
}

/// Errors raised while building a schema. Always startup-fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema cannot be empty")]
    EmptySchema,

    #[error("Feature name cannot be empty")]
    EmptyFeatureName,

    #[error("Feature '{feature}' has invalid domain [{lo}, {hi}]: lower bound must be below upper bound")]
    InvalidDomain { feature: String, lo: f64, hi: f64 },

    #[error("Feature '{0}' has a non-finite domain bound")]
    NonFiniteDomain(String),
}

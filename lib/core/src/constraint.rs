//! Constraint payloads and validation
//!
//! A [`RawConstraintPayload`] is untrusted JSON (`feature -> {min?, max?}`)
//! coming from the semantic translator, the keyword fallback or the caller.
//! It stays an opaque document until [`validate`] narrows it into a
//! [`ConstraintSet`] whose keys all exist in the schema and whose ranges all
//! sit inside their feature's domain.
//!
//! Validation never fails: entries that cannot be trusted are dropped.

use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Untrusted constraint document, kept as parsed JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawConstraintPayload(Map<String, Value>);

impl RawConstraintPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept any JSON object; anything else has the wrong shape.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Insert a range for `feature`, replacing any previous entry.
    pub fn insert(&mut self, feature: impl Into<String>, min: Option<f64>, max: Option<f64>) {
        let mut range = Map::new();
        if let Some(min) = min {
            range.insert("min".to_string(), Value::from(min));
        }
        if let Some(max) = max {
            range.insert("max".to_string(), Value::from(max));
        }
        self.0.insert(feature.into(), Value::Object(range));
    }

    pub fn get(&self, feature: &str) -> Option<&Value> {
        self.0.get(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Whether the document has the `feature -> {min?, max?}` shape.
    ///
    /// An empty document qualifies. Otherwise at least one entry must be an
    /// object carrying a numeric `min` or `max`; a document made only of
    /// entries like `"avg_temp_c": "warm"` does not.
    pub fn has_constraint_shape(&self) -> bool {
        self.0.is_empty()
            || self.0.values().any(|entry| {
                entry.as_object().is_some_and(|range| {
                    matches!(bound(range, "min"), Ok(Some(_))) || matches!(bound(range, "max"), Ok(Some(_)))
                })
            })
    }
}

/// A bound that is present but neither null nor a finite number
#[derive(Debug)]
struct MalformedBound;

/// Read a bound from a raw range object. Missing and `null` are absent.
fn bound(range: &Map<String, Value>, key: &str) -> Result<Option<f64>, MalformedBound> {
    match range.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or(MalformedBound),
    }
}

/// An inclusive `[min, max]` range with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// `None` when `min > max` or either bound is not finite.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min <= max).then_some(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Overlap of two ranges, `None` when they are disjoint.
    pub fn intersect(&self, other: &FeatureRange) -> Option<FeatureRange> {
        FeatureRange::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Distance from `value` to the nearest bound; zero inside the range.
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Validated constraints: schema-known features mapped to in-domain ranges.
///
/// Only [`validate`] and [`ConstraintSet::merge_explicit`] build non-empty
/// sets, so every instance upholds `lo <= min <= max <= hi` and no range
/// spans its feature's whole domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConstraintSet {
    ranges: BTreeMap<String, FeatureRange>,
}

impl ConstraintSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureRange> {
        self.ranges.get(feature)
    }

    /// Active constraints, sorted by feature name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureRange)> {
        self.ranges.iter().map(|(name, range)| (name.as_str(), range))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Turn the set back into a raw payload (both bounds present).
    pub fn to_raw(&self) -> RawConstraintPayload {
        let mut raw = RawConstraintPayload::new();
        for (feature, range) in &self.ranges {
            raw.insert(feature.clone(), Some(range.min), Some(range.max));
        }
        raw
    }

    /// Merge caller-supplied constraints into derived ones.
    ///
    /// Features present in both are intersected. When the intersection is
    /// empty the explicit range wins outright.
    pub fn merge_explicit(mut self, explicit: &ConstraintSet) -> ConstraintSet {
        for (feature, explicit_range) in &explicit.ranges {
            let merged = match self.ranges.get(feature) {
                Some(derived) => derived.intersect(explicit_range).unwrap_or(*explicit_range),
                None => *explicit_range,
            };
            self.ranges.insert(feature.clone(), merged);
        }
        self
    }
}

/// Sanitize an untrusted payload against the schema.
///
/// Entries are processed in feature-name order. Per entry:
/// unknown feature or non-object value is dropped; both bounds absent is
/// dropped; bounds are clamped into the domain with a missing bound taken
/// from the domain edge; an inverted range is dropped; a range covering the
/// whole domain is dropped.
pub fn validate(raw: &RawConstraintPayload, schema: &FeatureSchema) -> ConstraintSet {
    let mut entries: Vec<(&String, &Value)> = raw.0.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut ranges = BTreeMap::new();
    for (feature, value) in entries {
        let Some((lo, hi)) = schema.domain_of(feature) else {
            debug!(feature = %feature, "Dropping constraint on unknown feature");
            continue;
        };

        let Some(range) = value.as_object() else {
            debug!(feature = %feature, "Dropping constraint that is not an object");
            continue;
        };

        let (raw_min, raw_max) = match (bound(range, "min"), bound(range, "max")) {
            (Ok(min), Ok(max)) => (min, max),
            _ => {
                debug!(feature = %feature, "Dropping constraint with a non-numeric bound");
                continue;
            }
        };
        if raw_min.is_none() && raw_max.is_none() {
            debug!(feature = %feature, "Dropping constraint without bounds");
            continue;
        }

        let min = raw_min.unwrap_or(lo).max(lo);
        let max = raw_max.unwrap_or(hi).min(hi);

        if min > max {
            debug!(feature = %feature, min, max, "Dropping unsatisfiable constraint");
            continue;
        }

        if min == lo && max == hi {
            debug!(feature = %feature, "Dropping full-domain constraint");
            continue;
        }

        ranges.insert(feature.clone(), FeatureRange { min, max });
    }

    ConstraintSet { ranges }
}

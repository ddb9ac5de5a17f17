use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature used as the popularity proxy when a destination has no explicit
/// `popularity` value.
pub const POPULARITY_FEATURE: &str = "wikipedia_pageviews";

/// Whether a destination is a city or a wider region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    #[default]
    City,
    Region,
}

/// Major geographic regions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Continent {
    Europe,
    Asia,
    Africa,
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Oceania,
}

impl Continent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Continent::Europe => "Europe",
            Continent::Asia => "Asia",
            Continent::Africa => "Africa",
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Oceania => "Oceania",
        }
    }
}

impl std::fmt::Display for Continent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Normalized feature values of one destination, keyed by feature name.
///
/// May carry a subset of the schema's features; missing features are
/// scored as unknown by the ranking engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&String, &mut f64) -> bool) {
        self.0.retain(keep);
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A destination: identity metadata plus its feature vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub id: String,
    pub name: String,

    pub country: String,
    pub continent: Continent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(rename = "type", default)]
    pub destination_type: DestinationType,
    #[serde(default)]
    pub location: Location,

    #[serde(default)]
    pub features: FeatureVector,

    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Explicit popularity used for tie-breaking. Falls back to the
    /// `wikipedia_pageviews` feature when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

impl Destination {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        country: impl Into<String>,
        continent: Continent,
        features: FeatureVector,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: country.into(),
            continent,
            region: None,
            destination_type: DestinationType::City,
            location: Location::default(),
            features,
            images: Vec::new(),
            description: None,
            popularity: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = Some(popularity);
        self
    }

    /// Popularity proxy for tie-breaking: explicit popularity, else the
    /// pageviews feature, else zero. Never NaN.
    pub fn popularity_proxy(&self) -> f64 {
        self.popularity
            .or_else(|| self.features.get(POPULARITY_FEATURE))
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_ingestion_record() {
        let value = json!({
            "id": "lisbon",
            "name": "Lisbon",
            "country": "Portugal",
            "continent": "Europe",
            "type": "city",
            "location": {"lat": 38.72, "lon": -9.14},
            "features": {"avg_temp_c": 0.55, "wikipedia_pageviews": 0.8},
            "images": []
        });
        let dest: Destination = serde_json::from_value(value).unwrap();
        assert_eq!(dest.id, "lisbon");
        assert_eq!(dest.continent, Continent::Europe);
        assert_eq!(dest.destination_type, DestinationType::City);
        assert_eq!(dest.features.get("avg_temp_c"), Some(0.55));
        assert_eq!(dest.features.get("elevation"), None);
    }

    #[test]
    fn test_continent_names() {
        let c: Continent = serde_json::from_value(json!("North America")).unwrap();
        assert_eq!(c, Continent::NorthAmerica);
        assert_eq!(c.to_string(), "North America");
    }

    #[test]
    fn test_popularity_proxy() {
        let features: FeatureVector = [("wikipedia_pageviews", 0.4)].into_iter().collect();
        let dest = Destination::new("a", "A", "X", Continent::Asia, features);
        assert_eq!(dest.popularity_proxy(), 0.4);

        let dest = dest.with_popularity(0.9);
        assert_eq!(dest.popularity_proxy(), 0.9);

        let bare = Destination::new("b", "B", "X", Continent::Asia, FeatureVector::default());
        assert_eq!(bare.popularity_proxy(), 0.0);
    }
}

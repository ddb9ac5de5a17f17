// Geographic pre-filters applied to the corpus before scoring
use crate::destination::Destination;
use serde::{Deserialize, Serialize};

pub trait Filter {
    fn matches(&self, destination: &Destination) -> bool;
}

/// Accepts every destination
pub struct MatchAll;

impl Filter for MatchAll {
    fn matches(&self, _destination: &Destination) -> bool {
        true
    }
}

/// Continent / region / country filter. Every field that is set must match,
/// compared case-insensitively; blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl GeoFilter {
    pub fn is_empty(&self) -> bool {
        [&self.continent, &self.region, &self.country]
            .iter()
            .all(|field| active(field).is_none())
    }
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn field_matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match active(wanted) {
        None => true,
        Some(wanted) => actual
            .map(|actual| actual.trim().eq_ignore_ascii_case(wanted))
            .unwrap_or(false),
    }
}

impl Filter for GeoFilter {
    fn matches(&self, destination: &Destination) -> bool {
        field_matches(&self.continent, Some(destination.continent.as_str()))
            && field_matches(&self.region, destination.region.as_deref())
            && field_matches(&self.country, Some(destination.country.as_str()))
    }
}

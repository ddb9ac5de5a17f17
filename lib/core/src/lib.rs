//! # wanderx Core
//!
//! Core library for the wanderx destination search engine.
//!
//! This crate provides the data model and the trust boundary:
//!
//! - [`FeatureSchema`] - Known features, their domains and polarity
//! - [`Destination`] / [`FeatureVector`] - One destination and its normalized features
//! - [`Corpus`] / [`SharedCorpus`] - The immutable destination list and its swappable handle
//! - [`GeoFilter`] - Continent / region / country pre-filter
//! - [`validate`] - Narrow an untrusted [`RawConstraintPayload`] into a [`ConstraintSet`]
//!
//! ## Example
//!
//! ```rust
//! use wanderx_core::{validate, FeatureSchema, RawConstraintPayload};
//! use serde_json::json;
//!
//! let schema = FeatureSchema::travel_default();
//! let raw = RawConstraintPayload::from_value(json!({
//!     "tourism_density": {"max": 0.3},
//!     "foo": {"max": 5}
//! }))
//! .unwrap();
//!
//! let constraints = validate(&raw, &schema);
//! assert_eq!(constraints.len(), 1);
//! assert!(constraints.get("foo").is_none());
//! ```

pub mod error;
pub mod schema;
pub mod destination;
pub mod corpus;
pub mod filter;
pub mod constraint;

pub use error::{Error, Result};
pub use schema::{FeatureSchema, FeatureSpec, Polarity, SchemaError};
pub use destination::{Continent, Destination, DestinationType, FeatureVector, Location, POPULARITY_FEATURE};
pub use corpus::{Corpus, SharedCorpus};
pub use filter::{Filter, GeoFilter, MatchAll};
pub use constraint::{validate, ConstraintSet, FeatureRange, RawConstraintPayload};

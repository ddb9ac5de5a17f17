//! Destination corpus
//!
//! The corpus is loaded once, validated against the feature schema and then
//! never mutated. Requests read it through an `Arc` snapshot; reloading
//! builds a complete new corpus and swaps the pointer.

use crate::destination::Destination;
use crate::filter::Filter;
use crate::schema::FeatureSchema;
use crate::{Error, Result};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

/// Ordered, immutable list of destinations with an id index
#[derive(Debug, Default)]
pub struct Corpus {
    destinations: Vec<Destination>,
    index: AHashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus, checking every destination against the schema.
    ///
    /// Feature values outside the schema domain, non-finite values and
    /// duplicate ids are errors. Features the schema does not declare are
    /// dropped with a warning.
    pub fn new(destinations: Vec<Destination>, schema: &FeatureSchema) -> Result<Self> {
        let mut checked = Vec::with_capacity(destinations.len());
        let mut index = AHashMap::with_capacity(destinations.len());

        for mut destination in destinations {
            if index.contains_key(&destination.id) {
                return Err(Error::DuplicateDestination(destination.id));
            }

            let mut unknown = Vec::new();
            destination.features.retain(|feature, _| {
                let known = schema.is_known(feature);
                if !known {
                    unknown.push(feature.clone());
                }
                known
            });
            if !unknown.is_empty() {
                warn!(
                    destination = %destination.id,
                    features = ?unknown,
                    "Dropping features not declared in schema"
                );
            }

            for (feature, value) in destination.features.iter() {
                let Some((lo, hi)) = schema.domain_of(feature) else {
                    continue;
                };
                if !value.is_finite() || value < lo || value > hi {
                    return Err(Error::FeatureOutOfDomain {
                        destination: destination.id.clone(),
                        feature: feature.to_string(),
                        value,
                        lo,
                        hi,
                    });
                }
            }

            index.insert(destination.id.clone(), checked.len());
            checked.push(destination);
        }

        Ok(Self {
            destinations: checked,
            index,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Destination> {
        self.index.get(id).map(|&i| &self.destinations[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Destination> {
        self.destinations.iter()
    }

    /// Destinations accepted by `filter`, in corpus order.
    pub fn filtered<'a, F: Filter + ?Sized>(
        &'a self,
        filter: &'a F,
    ) -> impl Iterator<Item = &'a Destination> + 'a {
        self.destinations.iter().filter(move |d| filter.matches(d))
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

/// Process-wide handle to the current corpus.
///
/// Readers take a cheap `Arc` snapshot and keep it for the whole request;
/// [`SharedCorpus::replace`] swaps in a new corpus without touching the one
/// in-flight requests are reading.
#[derive(Debug)]
pub struct SharedCorpus {
    current: RwLock<Arc<Corpus>>,
}

impl SharedCorpus {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            current: RwLock::new(Arc::new(corpus)),
        }
    }

    pub fn snapshot(&self) -> Arc<Corpus> {
        self.current.read().clone()
    }

    /// Install `corpus` and return the previous one.
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        std::mem::replace(&mut *self.current.write(), Arc::new(corpus))
    }
}

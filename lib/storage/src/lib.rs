//! # wanderx Storage
//!
//! File-backed inputs for the search engine:
//!
//! - [`JsonCorpusLoader`] - destination corpus from JSON, behind the [`CorpusLoader`] trait
//! - [`reload`] - load a fresh corpus and swap it into a [`wanderx_core::SharedCorpus`]
//! - [`load_schema`] / [`load_keyword_table`] - optional schema and keyword files

pub mod config;
pub mod loader;

pub use config::{load_keyword_table, load_schema};
pub use loader::{reload, CorpusLoader, JsonCorpusLoader};

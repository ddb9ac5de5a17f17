use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use wanderx_core::{Corpus, Destination, Error, FeatureSchema, Result, SharedCorpus};

/// Supplies the destination corpus. Called once at startup and again on
/// reload; a failure at startup is fatal.
pub trait CorpusLoader: Send + Sync {
    fn load(&self) -> Result<Corpus>;
}

/// Accepted corpus file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Bare(Vec<Destination>),
    Wrapped { destinations: Vec<Destination> },
}

impl CorpusFile {
    fn into_destinations(self) -> Vec<Destination> {
        match self {
            CorpusFile::Bare(destinations) => destinations,
            CorpusFile::Wrapped { destinations } => destinations,
        }
    }
}

/// Loads destinations from a JSON file, either a bare array or
/// `{"destinations": [...]}`
pub struct JsonCorpusLoader {
    path: PathBuf,
    schema: Arc<FeatureSchema>,
}

impl JsonCorpusLoader {
    pub fn new<P: AsRef<Path>>(path: P, schema: Arc<FeatureSchema>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusLoader for JsonCorpusLoader {
    fn load(&self) -> Result<Corpus> {
        let started = Instant::now();
        let file = File::open(&self.path).map_err(|e| {
            Error::CorpusLoad(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        let parsed: CorpusFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::CorpusLoad(format!("invalid corpus {}: {}", self.path.display(), e))
        })?;

        let corpus = Corpus::new(parsed.into_destinations(), &self.schema)?;
        info!(
            path = %self.path.display(),
            destinations = corpus.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Corpus loaded"
        );
        Ok(corpus)
    }
}

/// Load a fresh corpus and swap it in. On failure the current corpus stays.
pub fn reload(loader: &dyn CorpusLoader, shared: &SharedCorpus) -> Result<usize> {
    let corpus = loader.load()?;
    let count = corpus.len();
    let previous = shared.replace(corpus);
    info!(previous = previous.len(), current = count, "Corpus swapped");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const RECORDS: &str = r#"[
        {"id": "lisbon", "name": "Lisbon", "country": "Portugal", "continent": "Europe",
         "type": "city", "location": {"lat": 38.72, "lon": -9.14},
         "features": {"avg_temp_c": 0.58, "tourism_density": 0.7}, "images": []},
        {"id": "bali", "name": "Bali", "country": "Indonesia", "continent": "Asia",
         "type": "region", "features": {"avg_temp_c": 0.75}}
    ]"#;

    #[test]
    fn test_load_bare_array() {
        let file = write_json(RECORDS);
        let loader = JsonCorpusLoader::new(file.path(), Arc::new(FeatureSchema::travel_default()));
        let corpus = loader.load().unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("bali").unwrap().country, "Indonesia");
    }

    #[test]
    fn test_load_wrapped() {
        let file = write_json(&format!(r#"{{"destinations": {RECORDS}, "total": 2}}"#));
        let loader = JsonCorpusLoader::new(file.path(), Arc::new(FeatureSchema::travel_default()));
        assert_eq!(loader.load().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = JsonCorpusLoader::new("/nonexistent/corpus.json", Arc::new(FeatureSchema::travel_default()));
        assert!(matches!(loader.load(), Err(Error::CorpusLoad(_))));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let file = write_json("{not json");
        let loader = JsonCorpusLoader::new(file.path(), Arc::new(FeatureSchema::travel_default()));
        assert!(matches!(loader.load(), Err(Error::CorpusLoad(_))));
    }

    #[test]
    fn test_out_of_domain_is_error() {
        let file = write_json(
            r#"[{"id": "x", "name": "X", "country": "Y", "continent": "Africa", "features": {"elevation": 3.0}}]"#,
        );
        let loader = JsonCorpusLoader::new(file.path(), Arc::new(FeatureSchema::travel_default()));
        assert!(matches!(loader.load(), Err(Error::FeatureOutOfDomain { .. })));
    }

    #[test]
    fn test_reload_keeps_old_corpus_on_failure() {
        let schema = Arc::new(FeatureSchema::travel_default());
        let good = write_json(RECORDS);
        let shared = SharedCorpus::new(JsonCorpusLoader::new(good.path(), schema.clone()).load().unwrap());

        let broken = JsonCorpusLoader::new("/nonexistent/corpus.json", schema.clone());
        assert!(reload(&broken, &shared).is_err());
        assert_eq!(shared.snapshot().len(), 2);

        let smaller = write_json(r#"[{"id": "a", "name": "A", "country": "B", "continent": "Oceania"}]"#);
        let count = reload(&JsonCorpusLoader::new(smaller.path(), schema), &shared).unwrap();
        assert_eq!(count, 1);
        assert!(shared.snapshot().get("a").is_some());
    }
}

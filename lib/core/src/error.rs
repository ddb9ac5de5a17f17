use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Duplicate destination id: {0}")]
    DuplicateDestination(String),

    #[error("Destination '{destination}' has value {value} for feature '{feature}', outside domain [{lo}, {hi}]")]
    FeatureOutOfDomain {
        destination: String,
        feature: String,
        value: f64,
        lo: f64,
        hi: f64,
    },

    #[error("Corpus load error: {0}")]
    CorpusLoad(String),
}

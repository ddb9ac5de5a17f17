pub mod rest;

pub use rest::{ApiError, AppState, RestApi, RestConfig, DEFAULT_CORS_ORIGINS};

use actix_cors::Cors;
use actix_web::http::{header, StatusCode, Uri};
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError, Result as ActixResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use wanderx_core::{Destination, Filter, GeoFilter};
use wanderx_search::{SearchOrchestrator, SearchRequest};
use wanderx_storage::CorpusLoader;

/// Origins allowed when none are configured (local frontend dev servers)
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:5174"];

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
    pub loader: Arc<dyn CorpusLoader>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SearchOrchestrator>, loader: Arc<dyn CorpusLoader>) -> Self {
        Self { orchestrator, loader }
    }
}

/// Listener and CORS settings
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub bind: String,
    pub port: u16,
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
}

impl RestConfig {
    /// Reject CORS origins the CORS middleware would panic on
    pub fn check_origins(&self) -> Result<(), ApiError> {
        for origin in self.cors_origins.iter().filter(|o| o.as_str() != "*") {
            let well_formed = origin
                .parse::<Uri>()
                .is_ok_and(|uri| uri.scheme().is_some() && uri.host().is_some())
                && header::HeaderValue::from_str(origin).is_ok();
            if !well_formed {
                return Err(ApiError::InvalidOrigin(origin.clone()));
            }
        }
        Ok(())
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Destination not found: {0}")]
    NotFound(String),

    #[error("Reload failed: {0}")]
    Reload(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Reload(_) | ApiError::InvalidOrigin(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

#[derive(Serialize)]
struct DestinationList {
    destinations: Vec<Destination>,
    total: usize,
}

#[derive(Serialize)]
struct ReloadResult {
    result: bool,
    destinations: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, config: RestConfig) -> std::io::Result<()> {
        config
            .check_origins()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        let origins = config.cors_origins.clone();
        info!(bind = %config.bind, port = config.port, "Starting REST API");

        HttpServer::new(move || {
            App::new()
                .wrap(cors(&origins))
                .configure(|cfg| routes(cfg, state.clone()))
        })
        .bind((config.bind.as_str(), config.port))?
        .run()
        .await
    }
}

fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(300);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Register every route on `cfg`
pub fn routes(cfg: &mut web::ServiceConfig, state: AppState) {
    cfg.app_data(web::Data::new(state))
        .route("/health", web::get().to(health))
        .route("/api/destinations", web::get().to(list_destinations))
        .route("/api/destinations/{id}", web::get().to(get_destination))
        .route("/api/search", web::post().to(search))
        .route("/api/admin/reload", web::post().to(reload_corpus));
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

async fn list_destinations(
    state: web::Data<AppState>,
    filter: web::Query<GeoFilter>,
) -> ActixResult<HttpResponse> {
    let corpus = state.orchestrator.corpus().snapshot();
    let destinations: Vec<Destination> = corpus
        .iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect();

    Ok(HttpResponse::Ok().json(DestinationList {
        total: destinations.len(),
        destinations,
    }))
}

async fn get_destination(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let corpus = state.orchestrator.corpus().snapshot();
    match corpus.get(&id) {
        Some(destination) => Ok(HttpResponse::Ok().json(destination)),
        None => Err(ApiError::NotFound(id)),
    }
}

async fn search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    // dropping this future on client disconnect also drops the translator call
    let response = state.orchestrator.search(&req).await;
    Ok(HttpResponse::Ok().json(response))
}

async fn reload_corpus(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let loader = state.loader.clone();
    let shared = state.orchestrator.corpus().clone();

    let outcome = web::block(move || wanderx_storage::reload(loader.as_ref(), &shared))
        .await
        .map_err(|e| ApiError::Reload(e.to_string()))?;

    match outcome {
        Ok(count) => Ok(HttpResponse::Ok().json(ReloadResult {
            result: true,
            destinations: count,
        })),
        Err(e) => {
            error!(error = %e, "Corpus reload failed, keeping current corpus");
            Err(ApiError::Reload(e.to_string()))
        }
    }
}

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wanderx_api::{AppState, RestApi, RestConfig, DEFAULT_CORS_ORIGINS};
use wanderx_core::SharedCorpus;
use wanderx_search::{
    FallbackCompiler, LlmTranslator, SearchConfig, SearchOrchestrator, Translator,
};
use wanderx_storage::{load_keyword_table, load_schema, CorpusLoader, JsonCorpusLoader};

/// Natural-language travel destination search server
#[derive(Parser, Debug)]
#[command(name = "wanderx")]
#[command(about = "Natural-language travel destination search", long_about = None)]
struct Args {
    /// Destination corpus (JSON array or {"destinations": [...]})
    #[arg(short, long)]
    corpus: PathBuf,

    /// Feature schema file; the built-in travel schema is used when omitted
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Fallback keyword table; the built-in table is used when omitted
    #[arg(long)]
    keywords: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Address to bind the HTTP API to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Chat-completions endpoint of the semantic translator; keyword fallback only when omitted
    #[arg(long)]
    translator_url: Option<String>,

    /// Model name sent to the translator
    #[arg(long)]
    translator_model: Option<String>,

    /// Bearer token for the translator
    #[arg(long, env = "WANDERX_TRANSLATOR_API_KEY", hide_env_values = true)]
    translator_api_key: Option<String>,

    /// Translator timeout in milliseconds
    #[arg(long, default_value_t = 3000)]
    translator_timeout_ms: u64,

    /// Result cap when a request sets no limit
    #[arg(long)]
    default_limit: Option<usize>,

    /// Allowed CORS origin, repeatable; `*` allows any
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn build_translator(args: &Args) -> anyhow::Result<Option<Arc<dyn Translator>>> {
    let Some(url) = &args.translator_url else {
        warn!("No translator configured, every search uses the keyword fallback");
        return Ok(None);
    };

    let mut builder = LlmTranslator::builder().endpoint(url.clone());
    if let Some(model) = &args.translator_model {
        builder = builder.model(model.clone());
    }
    if let Some(key) = &args.translator_api_key {
        builder = builder.api_key(key.clone());
    }
    let translator = builder.build().context("failed to build translator client")?;

    info!(endpoint = %translator.endpoint(), model = %translator.model(), "Translator configured");
    let translator: Arc<dyn Translator> = Arc::new(translator);
    Ok(Some(translator))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting wanderx v{}", env!("CARGO_PKG_VERSION"));

    let schema = Arc::new(load_schema(args.schema.as_deref())?);
    info!("Schema: {} features", schema.len());

    let keywords = load_keyword_table(args.keywords.as_deref())?;
    let fallback = Arc::new(FallbackCompiler::new(&keywords, schema.clone()));
    info!("Fallback keywords: {}", fallback.keyword_count());

    let loader: Arc<dyn CorpusLoader> = Arc::new(JsonCorpusLoader::new(&args.corpus, schema.clone()));
    let corpus = loader
        .load()
        .with_context(|| format!("failed to load corpus {}", args.corpus.display()))?;
    info!("Corpus: {} destinations", corpus.len());
    let corpus = Arc::new(SharedCorpus::new(corpus));

    let translator = build_translator(&args)?;
    let config = SearchConfig {
        translator_timeout: Duration::from_millis(args.translator_timeout_ms),
        default_limit: args.default_limit,
        ..SearchConfig::default()
    };
    let orchestrator = Arc::new(SearchOrchestrator::new(
        schema,
        corpus,
        translator,
        fallback,
        config,
    ));

    let rest_config = RestConfig {
        bind: args.bind.clone(),
        port: args.http_port,
        cors_origins: if args.cors_origins.is_empty() {
            DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
        } else {
            args.cors_origins.clone()
        },
    };
    rest_config.check_origins()?;
    let state = AppState::new(orchestrator, loader);

    let http_handle = std::thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, rest_config).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("wanderx started successfully");
    info!("HTTP API: http://{}:{}/", args.bind, args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

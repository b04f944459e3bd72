use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use dealscope::config::Settings;
use dealscope::core::Engine;
use dealscope::corpus::CorpusStore;
use dealscope::routes::{self, AppState};
use dealscope::services::TracingUsageRecorder;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(settings: &Settings) {
    // LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

/// Periodically reload the corpus from its source
fn spawn_refresh(store: Arc<CorpusStore>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.reload()).await {
                Ok(Ok(info)) => info!("Scheduled corpus refresh published generation {}", info.generation),
                Ok(Err(e)) => error!("Scheduled corpus refresh failed: {}", e),
                Err(e) => error!("Scheduled corpus refresh task panicked: {}", e),
            }
        }
    });
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    init_logging(&settings);
    info!("Starting dealscope scoring service...");

    // Load the reference corpus; a broken corpus is fatal at startup
    let source = settings.corpus.source();
    let store = Arc::new(CorpusStore::open(source).unwrap_or_else(|e| {
        error!("Failed to load reference corpus: {}", e);
        panic!("Corpus error: {}", e);
    }));

    let corpus = store.info();
    info!(
        "Corpus {} loaded: {} indications, {} partners",
        corpus.version, corpus.indications, corpus.partners
    );

    if let Some(secs) = settings.corpus.refresh_interval_secs.filter(|s| *s > 0) {
        info!("Corpus refresh every {}s", secs);
        spawn_refresh(store.clone(), Duration::from_secs(secs));
    }

    let options = settings.engine_options();
    info!(
        "Engine initialized with partner weights {:?} and opportunity weights {:?}",
        options.partner_weights, options.opportunity_weights
    );

    // Build application state
    let app_state = AppState::new(
        Arc::new(Engine::new(store, options)),
        Arc::new(TracingUsageRecorder),
    );

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

use actix_web::{web, HttpResponse, Responder};
use crate::models::HealthResponse;
use crate::routes::{blocking_error_response, engine_error_response, AppState};

/// Configure health and corpus routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/corpus", web::get().to(corpus_info))
        .route("/corpus/reload", web::post().to(reload_corpus));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let info = state.engine.corpus_info();

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        corpus_version: info.version,
        corpus_generation: info.generation,
        timestamp: chrono::Utc::now(),
    })
}

/// Published corpus summary
///
/// GET /api/v1/corpus
async fn corpus_info(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.engine.corpus_info())
}

/// Rebuild the corpus from its source and publish it
///
/// POST /api/v1/corpus/reload
///
/// A failed reload keeps the previous snapshot live and returns 500.
async fn reload_corpus(state: web::Data<AppState>) -> impl Responder {
    let engine = state.engine.clone();
    tracing::info!("Corpus reload requested");

    match web::block(move || engine.reload_corpus()).await {
        Ok(Ok(info)) => {
            tracing::info!("Corpus reloaded to {} (generation {})", info.version, info.generation);
            HttpResponse::Ok().json(info)
        }
        Ok(Err(e)) => engine_error_response(&e),
        Err(e) => blocking_error_response(e),
    }
}

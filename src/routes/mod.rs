// Route exports
pub mod analysis;
pub mod corpus;

use actix_web::{error::BlockingError, web, HttpRequest, HttpResponse};
use serde::Serialize;
use std::sync::Arc;
use crate::core::{Analysis, Engine, EngineError};
use crate::models::{AnalysisResponse, ErrorResponse};
use crate::services::{UsageEvent, UsageRecorder};

/// Header carrying the caller's identity for usage metering
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub usage: Arc<dyn UsageRecorder>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, usage: Arc<dyn UsageRecorder>) -> Self {
        Self { engine, usage }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(corpus::configure)
            .configure(analysis::configure),
    );
}

pub(crate) fn user_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn error_response(status: u16, error: &str, message: String) -> HttpResponse {
    let body = ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status,
    };
    match status {
        400 => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub(crate) fn engine_error_response(e: &EngineError) -> HttpResponse {
    match e {
        EngineError::InvalidInput(message) => {
            tracing::info!("Rejected request: {}", message);
            error_response(400, "Validation failed", message.clone())
        }
        EngineError::Corpus(source) => {
            tracing::error!("Corpus error: {}", source);
            error_response(500, "Corpus unavailable", source.to_string())
        }
    }
}

pub(crate) fn blocking_error_response(e: BlockingError) -> HttpResponse {
    tracing::error!("Analysis worker failed: {}", e);
    error_response(500, "Analysis failed", e.to_string())
}

/// Turn an engine outcome into a response, metering successful calls
pub(crate) fn respond<T, F>(
    state: &AppState,
    outcome: Result<Result<Analysis<T>, EngineError>, BlockingError>,
    usage: F,
) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&T) -> UsageEvent,
{
    match outcome {
        Ok(Ok(analysis)) => {
            state.usage.record(usage(&analysis.result));
            HttpResponse::Ok().json(AnalysisResponse {
                result: analysis.result,
                corpus_version: analysis.corpus_version,
                generated_at: chrono::Utc::now(),
            })
        }
        Ok(Err(e)) => engine_error_response(&e),
        Err(e) => blocking_error_response(e),
    }
}

use actix_web::{web, HttpRequest, Responder};
use crate::models::{
    CompetitiveLandscapeResult, DeviceLandscapeRequest, DiagnosticLandscapeRequest,
    MarketSizingRequest, PartnerMatchRequest, PharmaLandscapeRequest, ScreenerRequest,
};
use crate::routes::{respond, user_id, AppState};
use crate::services::{UsageEvent, UsageFeature};

/// Configure all analysis routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/competitive/pharma", web::post().to(pharma_landscape))
        .route("/competitive/device", web::post().to(device_landscape))
        .route("/competitive/diagnostic", web::post().to(diagnostic_landscape))
        .route("/partners/match", web::post().to(match_partners))
        .route("/opportunities/screen", web::post().to(screen_opportunities))
        .route("/market/size", web::post().to(size_market));
}

fn landscape_event(
    feature: UsageFeature,
    user: Option<String>,
    subject: String,
    result: &CompetitiveLandscapeResult,
) -> UsageEvent {
    UsageEvent::new(feature, user, Some(subject))
        .with_metadata("match_kind", format!("{:?}", result.resolution.match_kind))
        .with_metadata("competitors", result.competitors.len())
        .with_metadata("crowding_score", result.summary.crowding_score)
}

/// Pharma competitive landscape
///
/// POST /api/v1/competitive/pharma
///
/// Request body:
/// ```json
/// {
///   "indication": "NSCLC",
///   "min_stage": "phase2",
///   "modality": "antibody",
///   "include_pipeline": true
/// }
/// ```
async fn pharma_landscape(
    state: web::Data<AppState>,
    req: web::Json<PharmaLandscapeRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = req.into_inner();
    let subject = request.indication.clone();
    tracing::info!("Pharma landscape requested for '{}'", subject);

    let engine = state.engine.clone();
    let outcome = web::block(move || engine.pharma_landscape(&request)).await;

    respond(&state, outcome, |result| {
        landscape_event(UsageFeature::PharmaLandscape, user_id(&http_req), subject, result)
    })
}

/// Device competitive landscape
///
/// POST /api/v1/competitive/device
async fn device_landscape(
    state: web::Data<AppState>,
    req: web::Json<DeviceLandscapeRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = req.into_inner();
    let subject = request.procedure.clone();
    tracing::info!("Device landscape requested for '{}'", subject);

    let engine = state.engine.clone();
    let outcome = web::block(move || engine.device_landscape(&request)).await;

    respond(&state, outcome, |result| {
        landscape_event(UsageFeature::DeviceLandscape, user_id(&http_req), subject, result)
    })
}

/// Diagnostic / companion diagnostic landscape
///
/// POST /api/v1/competitive/diagnostic
async fn diagnostic_landscape(
    state: web::Data<AppState>,
    req: web::Json<DiagnosticLandscapeRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = req.into_inner();
    let subject = request.biomarker.clone();
    tracing::info!("Diagnostic landscape requested for '{}'", subject);

    let engine = state.engine.clone();
    let outcome = web::block(move || engine.diagnostic_landscape(&request)).await;

    respond(&state, outcome, |result| {
        landscape_event(UsageFeature::DiagnosticLandscape, user_id(&http_req), subject, result)
    })
}

/// Partner matching
///
/// POST /api/v1/partners/match
///
/// Request body:
/// ```json
/// {
///   "indication": "NSCLC",
///   "development_stage": "phase2",
///   "geography_rights": ["US"],
///   "deal_types": ["licensing"],
///   "exclude_companies": [],
///   "minimum_match_score": 50,
///   "limit": 10
/// }
/// ```
async fn match_partners(
    state: web::Data<AppState>,
    req: web::Json<PartnerMatchRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = req.into_inner();
    let subject = request.indication.clone();
    let stage = request.development_stage;
    tracing::info!("Partner match requested for '{}' at {}", subject, stage);

    let engine = state.engine.clone();
    let outcome = web::block(move || engine.match_partners(&request)).await;

    respond(&state, outcome, |result| {
        UsageEvent::new(UsageFeature::PartnerMatch, user_id(&http_req), Some(subject))
            .with_metadata("development_stage", stage)
            .with_metadata("total_matches", result.total_matches)
    })
}

/// Opportunity screener
///
/// POST /api/v1/opportunities/screen
async fn screen_opportunities(
    state: web::Data<AppState>,
    req: web::Json<ScreenerRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = req.into_inner();
    tracing::info!(
        "Screen requested: sort {:?} {:?}, limit {}, offset {}",
        request.sort_by,
        request.sort_order,
        request.limit,
        request.offset
    );

    let engine = state.engine.clone();
    let outcome = web::block(move || engine.screen_opportunities(&request)).await;

    respond(&state, outcome, |result| {
        UsageEvent::new(UsageFeature::OpportunityScreen, user_id(&http_req), None)
            .with_metadata("total_count", result.total_count)
            .with_metadata("returned", result.opportunities.len())
    })
}

/// Market sizing
///
/// POST /api/v1/market/size
async fn size_market(
    state: web::Data<AppState>,
    req: web::Json<MarketSizingRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = req.into_inner();
    let subject = request.indication.clone();
    tracing::info!("Market sizing requested for '{}' in {}", subject, request.geography);

    let engine = state.engine.clone();
    let outcome = web::block(move || engine.size_market(&request)).await;

    respond(&state, outcome, |result| {
        UsageEvent::new(UsageFeature::MarketSizing, user_id(&http_req), Some(subject))
            .with_metadata("geography", &result.geography)
            .with_metadata("price_source", format!("{:?}", result.price_source))
    })
}

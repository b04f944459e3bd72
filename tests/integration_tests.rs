// Integration tests for dealscope

use std::path::Path;
use std::sync::Arc;
use actix_web::{test as actix_test, web, App};
use dealscope::core::{Engine, EngineOptions};
use dealscope::corpus::{CorpusSource, CorpusStore};
use dealscope::models::{
    DealType, DevelopmentStage, DeviceLandscapeRequest, DiagnosticLandscapeRequest, MatchKind,
    MarketSizingRequest, PartnerMatchRequest, PharmaLandscapeRequest, ScreenerRequest, SortBy,
    SortOrder,
};
use dealscope::routes::{configure_routes, AppState};
use dealscope::services::InMemoryUsageRecorder;

const DATA_FILES: &[&str] = &[
    "manifest.json",
    "indications.json",
    "biomarkers.json",
    "procedures.json",
    "pharma_competitors.json",
    "device_competitors.json",
    "diagnostic_competitors.json",
    "partners.json",
    "pricing.json",
];

fn create_engine() -> Engine {
    Engine::embedded().unwrap()
}

fn create_partner_request(indication: &str) -> PartnerMatchRequest {
    PartnerMatchRequest::new(
        indication,
        DevelopmentStage::Phase2,
        vec!["US".to_string(), "EU".to_string()],
        vec![DealType::Licensing, DealType::CoDevelopment],
    )
}

fn copy_data_dir(target: &Path) {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    for file in DATA_FILES {
        std::fs::copy(source.join(file), target.join(file)).unwrap();
    }
}

#[test]
fn test_integration_biomarker_spellings_are_symmetric() {
    let engine = create_engine();
    let hyphen = engine
        .diagnostic_landscape(&DiagnosticLandscapeRequest::new("PD-L1"))
        .unwrap()
        .result;
    let plain = engine
        .diagnostic_landscape(&DiagnosticLandscapeRequest::new("pdl1"))
        .unwrap()
        .result;

    assert_eq!(hyphen.resolution, plain.resolution);
    assert_eq!(hyphen.summary, plain.summary);
    assert_eq!(hyphen.competitors, plain.competitors);
    assert_eq!(hyphen.comparison_matrix, plain.comparison_matrix);
    assert!(
        ["Low", "Moderate", "High", "Extremely High"].contains(&hyphen.summary.crowding_label.as_str()),
        "{}",
        hyphen.summary.crowding_label
    );
}

#[test]
fn test_integration_procedure_aliases_are_symmetric() {
    let engine = create_engine();
    let tavr = engine.device_landscape(&DeviceLandscapeRequest::new("TAVR")).unwrap().result;
    let tavi = engine.device_landscape(&DeviceLandscapeRequest::new("TAVI")).unwrap().result;

    assert_eq!(tavr.resolution.match_kind, MatchKind::Exact);
    assert_eq!(tavr.resolution, tavi.resolution);
    assert_eq!(tavr.summary, tavi.summary);
    assert_eq!(tavr.market_share, tavi.market_share);
}

#[test]
fn test_integration_scores_stay_in_range() {
    let engine = create_engine();

    for indication in ["NSCLC", "Melanoma", "Alzheimer's Disease", "Obesity"] {
        let result = engine
            .pharma_landscape(&PharmaLandscapeRequest::new(indication))
            .unwrap()
            .result;
        let summary = &result.summary;
        assert!((1.0..=10.0).contains(&summary.crowding_score), "{}", indication);
        assert!(!summary.white_space.is_empty() && summary.white_space.len() <= 5);
        for segment in &summary.white_space {
            assert!((0.0..=10.0).contains(&segment.opportunity_score));
        }
        for entry in result.competitors.approved().iter().chain(result.competitors.pipeline()) {
            assert!((1.0..=10.0).contains(&entry.differentiation_score));
            assert!((1.0..=10.0).contains(&entry.evidence_strength));
        }
    }

    let partners = engine.match_partners(&create_partner_request("NSCLC")).unwrap().result;
    for partner in &partners.partners {
        assert!((0.0..=100.0).contains(&partner.match_score));
        for sub in partner.score_breakdown.as_array() {
            assert!((0.0..=100.0).contains(&sub));
        }
    }

    let screen = engine
        .screen_opportunities(&ScreenerRequest { limit: 250, ..ScreenerRequest::default() })
        .unwrap()
        .result;
    for row in &screen.opportunities {
        assert!((0.0..=100.0).contains(&row.opportunity_score));
        assert!((1.0..=10.0).contains(&row.crowding_score));
    }
}

#[test]
fn test_integration_results_are_deterministic() {
    let engine = create_engine();

    let first = engine.pharma_landscape(&PharmaLandscapeRequest::new("NSCLC")).unwrap();
    let second = engine.pharma_landscape(&PharmaLandscapeRequest::new("NSCLC")).unwrap();
    assert_eq!(first.result, second.result);

    let first = engine.match_partners(&create_partner_request("Melanoma")).unwrap();
    let second = engine.match_partners(&create_partner_request("Melanoma")).unwrap();
    assert_eq!(first.result, second.result);

    let first = engine.size_market(&MarketSizingRequest::new("Psoriasis")).unwrap();
    let second = engine.size_market(&MarketSizingRequest::new("Psoriasis")).unwrap();
    assert_eq!(first.result, second.result);
}

#[test]
fn test_integration_unknown_input_falls_back() {
    let engine = create_engine();
    let corpus = engine.store().snapshot();

    let pharma = engine
        .pharma_landscape(&PharmaLandscapeRequest::new("Zzyzx Qwertyuiop"))
        .unwrap()
        .result;
    assert_eq!(pharma.resolution.match_kind, MatchKind::NoMatch);
    assert_eq!(pharma.resolution.entities.len(), corpus.indications().len());

    let diagnostic = engine
        .diagnostic_landscape(&DiagnosticLandscapeRequest::new("Zzyzx Qwertyuiop"))
        .unwrap()
        .result;
    assert_eq!(diagnostic.resolution.match_kind, MatchKind::NoMatch);
    assert_eq!(diagnostic.resolution.entities.len(), corpus.biomarkers().len());

    let device = engine
        .device_landscape(&DeviceLandscapeRequest::new("TOTALLY_UNKNOWN_XYZ"))
        .unwrap()
        .result;
    assert_eq!(device.resolution.match_kind, MatchKind::NoMatch);
    assert_eq!(device.resolution.entities.len(), corpus.procedures().len());
    assert!(!device.summary.white_space.is_empty());
    assert!(device.summary.key_insight.len() > 20, "{}", device.summary.key_insight);
}

#[test]
fn test_integration_screener_pages_concatenate() {
    let engine = create_engine();
    let full = engine
        .screen_opportunities(&ScreenerRequest { limit: 250, ..ScreenerRequest::default() })
        .unwrap()
        .result;
    assert_eq!(full.total_count, full.opportunities.len());

    let mut paged = Vec::new();
    let mut offset = 0;
    loop {
        let page = engine
            .screen_opportunities(&ScreenerRequest { limit: 7, offset, ..ScreenerRequest::default() })
            .unwrap()
            .result;
        assert_eq!(page.total_count, full.total_count);
        if page.opportunities.is_empty() {
            break;
        }
        paged.extend(page.opportunities.into_iter().map(|row| row.indication));
        offset += 7;
    }

    let expected: Vec<String> = full.opportunities.into_iter().map(|row| row.indication).collect();
    assert_eq!(paged, expected);
}

#[test]
fn test_integration_screener_sorting() {
    let engine = create_engine();
    let request = ScreenerRequest {
        sort_by: SortBy::GlobalPrevalence,
        sort_order: SortOrder::Asc,
        limit: 250,
        ..ScreenerRequest::default()
    };
    let result = engine.screen_opportunities(&request).unwrap().result;

    assert_eq!(result.sort_by, SortBy::GlobalPrevalence);
    for pair in result.opportunities.windows(2) {
        assert!(pair[0].sort_value <= pair[1].sort_value);
        assert!(pair[0].global_prevalence <= pair[1].global_prevalence);
    }

    let mut filtered = ScreenerRequest { limit: 250, ..ScreenerRequest::default() };
    filtered.filters.max_crowding = Some(5.0);
    filtered.filters.min_opportunity_score = Some(30.0);
    let result = engine.screen_opportunities(&filtered).unwrap().result;
    for row in &result.opportunities {
        assert!(row.crowding_score <= 5.0);
        assert!(row.opportunity_score >= 30.0);
    }
}

#[test]
fn test_integration_partner_filters_hold() {
    let engine = create_engine();
    let mut request = create_partner_request("NSCLC");
    request.exclude_companies = vec!["pfizer".to_string(), "ROCHE".to_string()];
    request.minimum_match_score = Some(40.0);
    request.limit = Some(5);

    let result = engine.match_partners(&request).unwrap().result;

    assert!(result.partners.len() <= 5);
    assert!(result.total_matches >= result.partners.len());
    for partner in &result.partners {
        assert!(partner.match_score >= 40.0);
        assert_ne!(partner.company, "Pfizer");
        assert_ne!(partner.company, "Roche");
        assert!(!partner.rationale.is_empty());
    }
    for pair in result.partners.windows(2) {
        assert!(pair[0].match_score >= pair[1].match_score);
    }
}

#[test]
fn test_integration_partner_match_with_empty_partner_table() {
    let mut parts = CorpusSource::Embedded.read().unwrap();
    parts.partners.clear();
    let store = CorpusStore::open(CorpusSource::Parts(Box::new(parts))).unwrap();
    let engine = Engine::new(Arc::new(store), EngineOptions::default());

    let result = engine.match_partners(&create_partner_request("NSCLC")).unwrap().result;

    assert!(result.partners.is_empty());
    assert_eq!(result.total_matches, 0);
    assert_eq!(result.resolution.match_kind, MatchKind::Exact);
}

#[test]
fn test_integration_end_to_end_pharma_landscape() {
    let engine = create_engine();
    let mut request = PharmaLandscapeRequest::new("NSCLC");
    request.min_stage = Some(DevelopmentStage::Phase3);

    let analysis = engine.pharma_landscape(&request).unwrap();
    let result = &analysis.result;

    assert_eq!(analysis.corpus_version, engine.corpus_info().version);
    assert_eq!(result.query, "NSCLC");
    assert_eq!(result.summary.total_competitors, result.competitors.len());
    assert_eq!(result.summary.approved_count, result.competitors.approved().len());
    for entry in result.competitors.pipeline() {
        assert!(entry.stage.map_or(false, |s| s >= DevelopmentStage::Phase3));
    }
    assert!(!result.platform_comparison.is_empty());

    let body = serde_json::to_value(result).unwrap();
    assert_eq!(body["landscape"], "pharma");
    assert!(body["approved_drugs"].is_array());
    assert!(body["pipeline_drugs"].is_array());
}

#[test]
fn test_integration_market_sizing_funnel() {
    let engine = create_engine();
    let result = engine.size_market(&MarketSizingRequest::new("NSCLC")).unwrap().result;

    assert!(result.tam_usd >= result.sam_usd);
    assert!(result.sam_usd >= result.som_usd);
    assert!(result.prevalent_patients >= result.treated_patients);
    assert!(result.annual_price_usd > 0.0);
}

#[test]
fn test_integration_directory_reload() {
    let dir = tempfile::tempdir().unwrap();
    copy_data_dir(dir.path());

    let store = Arc::new(CorpusStore::open(CorpusSource::Directory(dir.path().to_path_buf())).unwrap());
    let engine = Engine::new(store.clone(), EngineOptions::default());
    let before = engine.store().snapshot();
    assert_eq!(engine.corpus_info().generation, 1);

    std::fs::write(
        dir.path().join("manifest.json"),
        r#"{"version": "2026.01", "as_of_year": 2026}"#,
    )
    .unwrap();
    let info = engine.reload_corpus().unwrap();
    assert_eq!(info.version, "2026.01");
    assert_eq!(info.generation, 2);

    // Snapshots taken before the reload are untouched
    assert_eq!(before.generation(), 1);
    assert_ne!(before.version(), "2026.01");

    // A broken file keeps the last good snapshot published
    std::fs::write(dir.path().join("partners.json"), "{ not json").unwrap();
    assert!(engine.reload_corpus().is_err());
    assert_eq!(store.generation(), 2);
    assert_eq!(engine.corpus_info().version, "2026.01");

    let analysis = engine.pharma_landscape(&PharmaLandscapeRequest::new("NSCLC")).unwrap();
    assert_eq!(analysis.corpus_generation, 2);
}

fn create_app_state() -> (AppState, Arc<InMemoryUsageRecorder>) {
    let usage = Arc::new(InMemoryUsageRecorder::new());
    let state = AppState::new(Arc::new(create_engine()), usage.clone());
    (state, usage)
}

#[actix_web::test]
async fn test_integration_health_and_corpus_routes() {
    let (state, _) = create_app_state();
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = actix_test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["corpus_generation"], 1);

    let req = actix_test::TestRequest::get().uri("/api/v1/corpus").to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert!(body["indications"].as_u64().unwrap() > 0);

    let req = actix_test::TestRequest::post().uri("/api/v1/corpus/reload").to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["generation"], 2);
}

#[actix_web::test]
async fn test_integration_malformed_json_is_rejected() {
    let (state, usage) = create_app_state();
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/opportunities/screen")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"limit\": ")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert!(usage.events().is_empty());
}

#[actix_web::test]
async fn test_integration_screen_route() {
    let (state, usage) = create_app_state();
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = actix_test::TestRequest::post()
        .uri("/api/v1/opportunities/screen")
        .set_json(serde_json::json!({ "sort_by": "unmet_need", "limit": 3 }))
        .to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["opportunities"].as_array().unwrap().len(), 3);
    assert_eq!(body["sort_by"], "unmet_need");
    assert_eq!(usage.events().len(), 1);
}

#[tokio::test]
async fn test_integration_reads_during_reload_see_whole_snapshots() {
    let engine = Arc::new(create_engine());

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            if i % 2 == 0 {
                engine.reload_corpus().map(|info| info.generation).unwrap()
            } else {
                let analysis = engine.pharma_landscape(&PharmaLandscapeRequest::new("NSCLC")).unwrap();
                assert!(!analysis.result.competitors.is_empty());
                analysis.corpus_generation
            }
        }));
    }

    for handle in handles {
        let generation = handle.await.unwrap();
        assert!((1..=5).contains(&generation));
    }
    assert_eq!(engine.corpus_info().generation, 5);
}

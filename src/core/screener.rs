//! Corpus-wide opportunity screening.
//!
//! Filters run cheapest first: record fields, then pharma crowding (needed
//! for `max_crowding`), then the opportunity score itself.

use std::cmp::Ordering;
use crate::core::competitive::pharma;
use crate::core::filters::{matches_screener_basics, meets_min_opportunity, within_max_crowding};
use crate::core::scoring::{
    clamp_0_to_100, clamp_unit, log_scaled, round1, weighted_average, CROWDING_BANDS,
    OPPORTUNITY_TIERS,
};
use crate::core::weights::OpportunityWeights;
use crate::corpus::ReferenceCorpus;
use crate::models::{
    IndicationRecord, OpportunityScoreResult, ScreenerRequest, ScreenerResult, SortBy, SortOrder,
};

/// Prevalence that earns the full market-magnitude score
const PREVALENCE_CEILING: f64 = 1.0e9;
const INCIDENCE_CEILING: f64 = 1.0e8;
/// Five-year CAGR (percent) that earns the full growth score
const GROWTH_CEILING_PCT: f64 = 20.0;
const PREVALENCE_SHARE: f64 = 0.7;

/// Opportunity score (0-100) from its four normalized components
pub fn opportunity_score(
    record: &IndicationRecord,
    crowding_score: f64,
    weights: &OpportunityWeights,
) -> f64 {
    let magnitude = PREVALENCE_SHARE * log_scaled(record.global_prevalence(), PREVALENCE_CEILING)
        + (1.0 - PREVALENCE_SHARE) * log_scaled(record.global_incidence(), INCIDENCE_CEILING);
    let growth = clamp_unit(record.cagr_5yr / GROWTH_CEILING_PCT);
    let unmet_need = clamp_unit((record.unmet_need - 1.0) / 9.0);
    let inverse_crowding = clamp_unit((10.0 - crowding_score) / 9.0);

    let components = [magnitude, growth, unmet_need, inverse_crowding];
    clamp_0_to_100(100.0 * weighted_average(&components, &weights.as_array()))
}

fn sort_value(result: &OpportunityScoreResult, sort_by: SortBy) -> f64 {
    match sort_by {
        SortBy::OpportunityScore => result.opportunity_score,
        SortBy::GlobalPrevalence => result.global_prevalence,
        SortBy::CrowdingScore => result.crowding_score,
        SortBy::GlobalIncidence => result.global_incidence,
        SortBy::Cagr5yr => result.cagr_5yr,
        SortBy::UnmetNeed => result.unmet_need,
    }
}

/// Screener row for one indication, given its crowding score
pub fn score_indication(
    record: &IndicationRecord,
    crowding_score: f64,
    weights: &OpportunityWeights,
    sort_by: SortBy,
) -> OpportunityScoreResult {
    let score = round1(opportunity_score(record, crowding_score, weights));
    let pipeline = &record.phase_distribution;

    let mut result = OpportunityScoreResult {
        indication: record.name.clone(),
        therapy_area: record.therapy_area.clone(),
        global_prevalence: record.global_prevalence(),
        global_incidence: record.global_incidence(),
        cagr_5yr: record.cagr_5yr,
        unmet_need: record.unmet_need,
        opportunity_score: score,
        opportunity_tier: OPPORTUNITY_TIERS.label(score).to_string(),
        crowding_score,
        crowding_label: CROWDING_BANDS.label(crowding_score).to_string(),
        pipeline_assets: pipeline.total() - pipeline.approved,
        sort_key: sort_by,
        sort_value: 0.0,
    };
    result.sort_value = sort_value(&result, sort_by);
    result
}

/// Order by the sort value in the requested direction; ties by name ascending
fn screener_order(a: &OpportunityScoreResult, b: &OpportunityScoreResult, order: SortOrder) -> Ordering {
    let by_value = match order {
        SortOrder::Asc => a.sort_value.total_cmp(&b.sort_value),
        SortOrder::Desc => b.sort_value.total_cmp(&a.sort_value),
    };
    by_value.then_with(|| a.indication.cmp(&b.indication))
}

/// Score, filter, sort and page every indication in the corpus
pub fn score_all_indications(
    corpus: &ReferenceCorpus,
    request: &ScreenerRequest,
    weights: &OpportunityWeights,
) -> ScreenerResult {
    let filters = &request.filters;

    let mut scored: Vec<OpportunityScoreResult> = corpus
        .indications()
        .iter()
        .filter(|record| matches_screener_basics(record, filters))
        .filter_map(|record| {
            let crowding = pharma::crowding_for(corpus, std::slice::from_ref(&record.name));
            if !within_max_crowding(crowding, filters) {
                return None;
            }
            let result = score_indication(record, crowding, weights, request.sort_by);
            meets_min_opportunity(result.opportunity_score, filters).then_some(result)
        })
        .collect();

    scored.sort_by(|a, b| screener_order(a, b, request.sort_order));
    let total_count = scored.len();

    let opportunities: Vec<OpportunityScoreResult> = scored
        .into_iter()
        .skip(request.offset)
        .take(request.limit)
        .collect();

    tracing::debug!(
        "Screened {} indications: {} passed filters, {} returned from offset {}",
        corpus.indications().len(),
        total_count,
        opportunities.len(),
        request.offset
    );

    ScreenerResult {
        opportunities,
        total_count,
        sort_by: request.sort_by,
        sort_order: request.sort_order,
        limit: request.limit,
        offset: request.offset,
    }
}

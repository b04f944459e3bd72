//! Request predicates applied before (or, for partners, after) scoring.

use crate::core::resolver::{normalize, Resolution};
use crate::models::{
    DeviceCompetitor, DeviceLandscapeRequest, DiagnosticCompetitor, DiagnosticLandscapeRequest,
    IndicationRecord, PharmaCompetitor, PharmaLandscapeRequest, RegulatoryStatus, ScreenerFilters,
};

/// Normalized equality or containment, so "antibody" matches "monoclonal antibody"
#[inline]
pub fn text_matches(value: &str, filter: &str) -> bool {
    let filter = normalize(filter);
    if filter.is_empty() {
        return true;
    }
    let value = normalize(value);
    value == filter || value.contains(&filter)
}

#[inline]
fn keeps_status(status: RegulatoryStatus, include_pipeline: bool) -> bool {
    include_pipeline || status.is_approved()
}

/// Check if a drug passes the pharma landscape filters
///
/// The stage floor only applies to pipeline assets; approved drugs always pass it.
#[inline]
pub fn matches_pharma_request(competitor: &PharmaCompetitor, request: &PharmaLandscapeRequest) -> bool {
    let status = competitor.profile.status;
    if !keeps_status(status, request.include_pipeline) {
        return false;
    }

    if let Some(min_stage) = request.min_stage {
        if !status.is_approved() && competitor.stage < min_stage {
            return false;
        }
    }

    if let Some(modality) = &request.modality {
        if !text_matches(&competitor.modality, modality) {
            return false;
        }
    }

    true
}

/// Check if a device passes the device landscape filters
#[inline]
pub fn matches_device_request(competitor: &DeviceCompetitor, request: &DeviceLandscapeRequest) -> bool {
    if !keeps_status(competitor.profile.status, request.include_pipeline) {
        return false;
    }

    if let Some(category) = &request.device_category {
        if !text_matches(&competitor.device_category, category) {
            return false;
        }
    }

    true
}

/// Check if a test passes the diagnostic landscape filters
///
/// `indication` is the resolved indication filter; a `NoMatch` resolution
/// does not narrow the list.
#[inline]
pub fn matches_diagnostic_request(
    competitor: &DiagnosticCompetitor,
    request: &DiagnosticLandscapeRequest,
    indication: Option<&Resolution>,
) -> bool {
    if let Some(test_type) = &request.test_type {
        if !text_matches(&competitor.test_type, test_type) {
            return false;
        }
    }

    if let Some(drug) = &request.linked_drug {
        if !competitor.linked_drugs.iter().any(|d| text_matches(d, drug)) {
            return false;
        }
    }

    if let Some(resolution) = indication.filter(|r| !r.is_fallback()) {
        if !competitor.indications.iter().any(|i| resolution.contains(i)) {
            return false;
        }
    }

    true
}

/// Screener filters that need nothing but the indication record
///
/// Crowding and opportunity filters are checked later, once those scores exist.
#[inline]
pub fn matches_screener_basics(indication: &IndicationRecord, filters: &ScreenerFilters) -> bool {
    if !filters.therapy_areas.is_empty() {
        let area = normalize(&indication.therapy_area);
        if !filters.therapy_areas.iter().any(|a| normalize(a) == area) {
            return false;
        }
    }

    if let Some(category) = filters.product_category {
        if !indication.product_categories.contains(&category) {
            return false;
        }
    }

    if let Some(min_prevalence) = filters.min_prevalence {
        if indication.global_prevalence() < min_prevalence {
            return false;
        }
    }

    if !filters.phases.is_empty()
        && !filters
            .phases
            .iter()
            .any(|stage| indication.phase_distribution.count(*stage) > 0)
    {
        return false;
    }

    true
}

#[inline]
pub fn within_max_crowding(crowding_score: f64, filters: &ScreenerFilters) -> bool {
    filters.max_crowding.map_or(true, |max| crowding_score <= max)
}

#[inline]
pub fn meets_min_opportunity(opportunity_score: f64, filters: &ScreenerFilters) -> bool {
    filters
        .min_opportunity_score
        .map_or(true, |min| opportunity_score >= min)
}

/// Whether a company is on the exclusion list (normalized comparison)
#[inline]
pub fn is_excluded_company(company: &str, exclude: &[String]) -> bool {
    let company = normalize(company);
    exclude.iter().any(|e| normalize(e) == company)
}

#[inline]
pub fn meets_min_match_score(match_score: f64, minimum: Option<f64>) -> bool {
    minimum.map_or(true, |min| match_score >= min)
}

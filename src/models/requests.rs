use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{DealType, DevelopmentStage, ProductCategory, GLOBAL_GEOGRAPHY};

/// Pharma competitive landscape for an indication
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PharmaLandscapeRequest {
    #[validate(length(min = 1))]
    pub indication: String,
    /// Only keep pipeline assets at or beyond this stage
    #[serde(default)]
    pub min_stage: Option<DevelopmentStage>,
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default = "default_true")]
    pub include_pipeline: bool,
}

impl PharmaLandscapeRequest {
    pub fn new(indication: impl Into<String>) -> Self {
        Self {
            indication: indication.into(),
            min_stage: None,
            modality: None,
            include_pipeline: true,
        }
    }
}

/// Device competitive landscape for a procedure
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeviceLandscapeRequest {
    #[validate(length(min = 1))]
    pub procedure: String,
    #[serde(default)]
    pub device_category: Option<String>,
    #[serde(default = "default_true")]
    pub include_pipeline: bool,
}

impl DeviceLandscapeRequest {
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            device_category: None,
            include_pipeline: true,
        }
    }
}

/// Diagnostic / companion diagnostic landscape for a biomarker
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiagnosticLandscapeRequest {
    #[validate(length(min = 1))]
    pub biomarker: String,
    #[serde(default)]
    pub test_type: Option<String>,
    #[serde(default)]
    pub linked_drug: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
}

impl DiagnosticLandscapeRequest {
    pub fn new(biomarker: impl Into<String>) -> Self {
        Self {
            biomarker: biomarker.into(),
            test_type: None,
            linked_drug: None,
            indication: None,
        }
    }
}

/// Partner search for an out-licensing or co-development deal
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PartnerMatchRequest {
    #[validate(length(min = 1))]
    pub indication: String,
    pub development_stage: DevelopmentStage,
    #[validate(length(min = 1))]
    pub geography_rights: Vec<String>,
    #[validate(length(min = 1))]
    pub deal_types: Vec<DealType>,
    #[serde(default)]
    pub mechanism: Option<String>,
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default)]
    pub exclude_companies: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub minimum_match_score: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

impl PartnerMatchRequest {
    pub fn new(
        indication: impl Into<String>,
        development_stage: DevelopmentStage,
        geography_rights: Vec<String>,
        deal_types: Vec<DealType>,
    ) -> Self {
        Self {
            indication: indication.into(),
            development_stage,
            geography_rights,
            deal_types,
            mechanism: None,
            modality: None,
            exclude_companies: vec![],
            minimum_match_score: None,
            limit: None,
        }
    }
}

/// Field the screener ranks by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    OpportunityScore,
    GlobalPrevalence,
    CrowdingScore,
    GlobalIncidence,
    #[serde(rename = "cagr_5yr")]
    Cagr5yr,
    UnmetNeed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Corpus-wide screening filters; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ScreenerFilters {
    #[serde(default)]
    pub therapy_areas: Vec<String>,
    #[serde(default)]
    pub product_category: Option<ProductCategory>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub min_prevalence: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 1.0, max = 10.0))]
    pub max_crowding: Option<f64>,
    /// Keep indications with at least one pipeline asset in any of these phases
    #[serde(default)]
    pub phases: Vec<DevelopmentStage>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_opportunity_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScreenerRequest {
    #[serde(default)]
    #[validate(nested)]
    pub filters: ScreenerFilters,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default = "default_screener_limit")]
    #[validate(range(min = 1, max = 250))]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for ScreenerRequest {
    fn default() -> Self {
        Self {
            filters: ScreenerFilters::default(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            limit: default_screener_limit(),
            offset: 0,
        }
    }
}

/// Market sizing for an indication in one geography
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MarketSizingRequest {
    #[validate(length(min = 1))]
    pub indication: String,
    #[serde(default = "default_geography")]
    #[validate(length(min = 1))]
    pub geography: String,
    /// Overrides the comparables-derived annual price
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub annual_price_usd: Option<f64>,
    #[serde(default = "default_peak_share")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub peak_share_pct: f64,
}

impl MarketSizingRequest {
    pub fn new(indication: impl Into<String>) -> Self {
        Self {
            indication: indication.into(),
            geography: default_geography(),
            annual_price_usd: None,
            peak_share_pct: default_peak_share(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_screener_limit() -> usize {
    20
}

fn default_geography() -> String {
    GLOBAL_GEOGRAPHY.to_string()
}

fn default_peak_share() -> f64 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_request_requires_geography_and_deal_type() {
        let request = PartnerMatchRequest::new("NSCLC", DevelopmentStage::Phase2, vec![], vec![]);
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("geography_rights"));
        assert!(fields.contains_key("deal_types"));
    }

    #[test]
    fn test_screener_request_defaults() {
        let request: ScreenerRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.sort_by, SortBy::OpportunityScore);
        assert_eq!(request.sort_order, SortOrder::Desc);
        assert_eq!(request.limit, 20);
        assert_eq!(request.offset, 0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_screener_rejects_out_of_range_crowding() {
        let mut request = ScreenerRequest::default();
        request.filters.max_crowding = Some(11.0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_unknown_stage_is_rejected_by_serde() {
        let body = r#"{"indication":"NSCLC","development_stage":"phase9","geography_rights":["US"],"deal_types":["licensing"]}"#;
        assert!(serde_json::from_str::<PartnerMatchRequest>(body).is_err());
    }

    #[test]
    fn test_sort_by_wire_names() {
        let sort: SortBy = serde_json::from_str("\"cagr_5yr\"").unwrap();
        assert_eq!(sort, SortBy::Cagr5yr);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::domain::{DevelopmentStage, RegulatoryStatus};
use crate::models::requests::{SortBy, SortOrder};

/// How a free-text query was resolved against the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    /// Nothing matched; the full corpus for the entity kind was used instead
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub match_kind: MatchKind,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandscapeKind {
    Pharma,
    Device,
    Diagnostic,
}

/// Under-served sub-segment of a landscape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteSpaceOpportunity {
    pub segment: String,
    pub coverage: usize,
    pub opportunity_score: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeSummary {
    pub crowding_score: f64,
    pub crowding_label: String,
    pub dominant_platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_penetration_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_penetration_pct: Option<f64>,
    pub total_competitors: usize,
    pub approved_count: usize,
    pub pipeline_count: usize,
    pub key_insight: String,
    pub white_space: Vec<WhiteSpaceOpportunity>,
}

/// One competitor row in a landscape list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorEntry {
    pub company: String,
    pub product: String,
    pub status: RegulatoryStatus,
    pub platform: String,
    pub differentiation_score: f64,
    pub evidence_strength: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<DevelopmentStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    /// Device category or test type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_share_pct: Option<f64>,
    /// Resolved entities this competitor is mapped to
    pub mapped_to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformComparisonRow {
    pub platform: String,
    pub competitor_count: usize,
    pub approved_count: usize,
    pub avg_differentiation: f64,
    pub avg_evidence_strength: f64,
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShareEntry {
    pub company: String,
    pub share_pct: f64,
}

/// Where the shares in a distribution came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareBasis {
    Reported,
    Normalized,
    EqualSplit,
    NoCompetitors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShareDistribution {
    pub entries: Vec<MarketShareEntry>,
    pub hhi_index: f64,
    pub concentration_label: String,
    pub basis: ShareBasis,
}

/// attribute -> competitor label -> value
pub type ComparisonMatrix = BTreeMap<String, BTreeMap<String, String>>;

/// Approved vs pipeline lists, named per landscape variant on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompetitorLists {
    Pharma {
        approved_drugs: Vec<CompetitorEntry>,
        pipeline_drugs: Vec<CompetitorEntry>,
    },
    Device {
        cleared_devices: Vec<CompetitorEntry>,
        pipeline_devices: Vec<CompetitorEntry>,
    },
    Diagnostic {
        approved_tests: Vec<CompetitorEntry>,
        pipeline_tests: Vec<CompetitorEntry>,
    },
}

impl CompetitorLists {
    pub fn approved(&self) -> &[CompetitorEntry] {
        match self {
            CompetitorLists::Pharma { approved_drugs, .. } => approved_drugs,
            CompetitorLists::Device { cleared_devices, .. } => cleared_devices,
            CompetitorLists::Diagnostic { approved_tests, .. } => approved_tests,
        }
    }

    pub fn pipeline(&self) -> &[CompetitorEntry] {
        match self {
            CompetitorLists::Pharma { pipeline_drugs, .. } => pipeline_drugs,
            CompetitorLists::Device { pipeline_devices, .. } => pipeline_devices,
            CompetitorLists::Diagnostic { pipeline_tests, .. } => pipeline_tests,
        }
    }

    pub fn len(&self) -> usize {
        self.approved().len() + self.pipeline().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveLandscapeResult {
    pub landscape: LandscapeKind,
    pub query: String,
    pub resolution: ResolutionSummary,
    pub summary: LandscapeSummary,
    #[serde(flatten)]
    pub competitors: CompetitorLists,
    pub platform_comparison: Vec<PlatformComparisonRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_share: Option<MarketShareDistribution>,
    pub comparison_matrix: ComparisonMatrix,
}

/// Screener row for one indication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScoreResult {
    pub indication: String,
    pub therapy_area: String,
    pub global_prevalence: f64,
    pub global_incidence: f64,
    pub cagr_5yr: f64,
    pub unmet_need: f64,
    pub opportunity_score: f64,
    pub opportunity_tier: String,
    pub crowding_score: f64,
    pub crowding_label: String,
    pub pipeline_assets: u32,
    pub sort_key: SortBy,
    pub sort_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerResult {
    pub opportunities: Vec<OpportunityScoreResult>,
    pub total_count: usize,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

/// The six partner sub-scores, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub therapeutic_alignment: f64,
    pub pipeline_gap: f64,
    pub deal_history: f64,
    pub financial_capacity: f64,
    pub geography_fit: f64,
    pub strategic_priority: f64,
}

impl ScoreBreakdown {
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.therapeutic_alignment,
            self.pipeline_gap,
            self.deal_history,
            self.financial_capacity,
            self.geography_fit,
            self.strategic_priority,
        ]
    }
}

/// Scored partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub company: String,
    pub match_score: f64,
    pub fit_label: String,
    pub score_breakdown: ScoreBreakdown,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerMatchResult {
    pub partners: Vec<MatchResult>,
    pub total_matches: usize,
    pub resolution: ResolutionSummary,
}

/// Where the annual price in a sizing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Input,
    IndicationComparables,
    TherapyAreaComparables,
    CorpusComparables,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSizingResult {
    pub query: String,
    pub resolution: ResolutionSummary,
    pub geography: String,
    pub prevalent_patients: f64,
    pub incident_patients: f64,
    pub treated_patients: f64,
    pub annual_price_usd: f64,
    pub price_source: PriceSource,
    pub tam_usd: f64,
    pub sam_usd: f64,
    pub som_usd: f64,
    pub peak_share_pct: f64,
    pub cagr_5yr: f64,
    pub projected_tam_5yr_usd: f64,
    pub comparables: Vec<crate::models::domain::PricingComparable>,
}

/// HTTP envelope adding the only time-dependent field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse<T> {
    #[serde(flatten)]
    pub result: T,
    pub corpus_version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub corpus_version: String,
    pub corpus_generation: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

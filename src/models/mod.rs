// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BiomarkerRecord, Competitor, CompetitorProfile, CorpusManifest, DealRecord, DealType,
    DevelopmentStage, DeviceCompetitor, DiagnosticCompetitor, EntityKind, FinancialTier,
    IndicationRecord, PartnerRecord, PharmaCompetitor, PhaseDistribution, PricingComparable,
    ProcedureRecord, ProductCategory, RegulatoryStatus, GLOBAL_GEOGRAPHY,
};
pub use requests::{
    DeviceLandscapeRequest, DiagnosticLandscapeRequest, MarketSizingRequest, PartnerMatchRequest,
    PharmaLandscapeRequest, ScreenerFilters, ScreenerRequest, SortBy, SortOrder,
};
pub use responses::{
    AnalysisResponse, ComparisonMatrix, CompetitiveLandscapeResult, CompetitorEntry, CompetitorLists,
    ErrorResponse, HealthResponse, LandscapeKind, LandscapeSummary, MarketShareDistribution,
    MarketShareEntry, MarketSizingResult, MatchKind, MatchResult, OpportunityScoreResult,
    PartnerMatchResult, PlatformComparisonRow, PriceSource, ResolutionSummary, ScoreBreakdown,
    ScreenerResult, ShareBasis, WhiteSpaceOpportunity,
};

//! Facade over the analyzers.
//!
//! Every call takes one corpus snapshot, checks its input contract and runs
//! synchronously. Callers on an async runtime should move calls onto a
//! blocking thread.

use std::sync::Arc;
use thiserror::Error;
use validator::Validate;
use crate::core::competitive::{device, diagnostic, pharma};
use crate::core::matcher::PartnerMatcher;
use crate::core::weights::{OpportunityWeights, PartnerWeights};
use crate::core::{market, screener};
use crate::corpus::{CorpusError, CorpusInfo, CorpusStore, ReferenceCorpus};
use crate::models::{
    CompetitiveLandscapeResult, DeviceLandscapeRequest, DiagnosticLandscapeRequest,
    MarketSizingRequest, MarketSizingResult, PartnerMatchRequest, PartnerMatchResult,
    PharmaLandscapeRequest, ScreenerRequest, ScreenerResult,
};

/// Largest screener page unless configured otherwise
pub const DEFAULT_MAX_SCREENER_LIMIT: usize = 250;

/// Errors returned by engine calls
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::InvalidInput(errors.to_string())
    }
}

/// Result of an engine call with the snapshot that produced it
#[derive(Debug, Clone)]
pub struct Analysis<T> {
    pub result: T,
    pub corpus_version: String,
    pub corpus_generation: u64,
}

impl<T> Analysis<T> {
    fn from_snapshot(corpus: &ReferenceCorpus, result: T) -> Self {
        Self {
            result,
            corpus_version: corpus.version().to_string(),
            corpus_generation: corpus.generation(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub partner_weights: PartnerWeights,
    pub opportunity_weights: OpportunityWeights,
    pub max_screener_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            partner_weights: PartnerWeights::default(),
            opportunity_weights: OpportunityWeights::default(),
            max_screener_limit: DEFAULT_MAX_SCREENER_LIMIT,
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::InvalidInput(format!("{} must not be blank", field)));
    }
    Ok(())
}

/// Scoring engine shared by every request handler
#[derive(Debug, Clone)]
pub struct Engine {
    store: Arc<CorpusStore>,
    matcher: PartnerMatcher,
    opportunity_weights: OpportunityWeights,
    max_screener_limit: usize,
}

impl Engine {
    pub fn new(store: Arc<CorpusStore>, options: EngineOptions) -> Self {
        Self {
            store,
            matcher: PartnerMatcher::new(options.partner_weights),
            opportunity_weights: options.opportunity_weights,
            max_screener_limit: options.max_screener_limit,
        }
    }

    /// Engine over the embedded corpus with default weights
    pub fn embedded() -> Result<Self, EngineError> {
        Ok(Self::new(Arc::new(CorpusStore::embedded()?), EngineOptions::default()))
    }

    pub fn store(&self) -> &Arc<CorpusStore> {
        &self.store
    }

    pub fn corpus_info(&self) -> CorpusInfo {
        self.store.info()
    }

    /// Rebuild the corpus; the previous snapshot stays live on failure
    pub fn reload_corpus(&self) -> Result<CorpusInfo, EngineError> {
        Ok(self.store.reload()?)
    }

    pub fn pharma_landscape(
        &self,
        request: &PharmaLandscapeRequest,
    ) -> Result<Analysis<CompetitiveLandscapeResult>, EngineError> {
        request.validate()?;
        require_text("indication", &request.indication)?;

        let corpus = self.store.snapshot();
        let result = pharma::analyze(&corpus, request);
        Ok(Analysis::from_snapshot(&corpus, result))
    }

    pub fn device_landscape(
        &self,
        request: &DeviceLandscapeRequest,
    ) -> Result<Analysis<CompetitiveLandscapeResult>, EngineError> {
        request.validate()?;
        require_text("procedure", &request.procedure)?;

        let corpus = self.store.snapshot();
        let result = device::analyze(&corpus, request);
        Ok(Analysis::from_snapshot(&corpus, result))
    }

    pub fn diagnostic_landscape(
        &self,
        request: &DiagnosticLandscapeRequest,
    ) -> Result<Analysis<CompetitiveLandscapeResult>, EngineError> {
        request.validate()?;
        require_text("biomarker", &request.biomarker)?;

        let corpus = self.store.snapshot();
        let result = diagnostic::analyze(&corpus, request);
        Ok(Analysis::from_snapshot(&corpus, result))
    }

    pub fn match_partners(
        &self,
        request: &PartnerMatchRequest,
    ) -> Result<Analysis<PartnerMatchResult>, EngineError> {
        request.validate()?;
        require_text("indication", &request.indication)?;
        if request.geography_rights.iter().all(|g| g.trim().is_empty()) {
            return Err(EngineError::InvalidInput(
                "geography_rights needs at least one region".to_string(),
            ));
        }

        let corpus = self.store.snapshot();
        let result = self.matcher.find_matches(&corpus, request);
        Ok(Analysis::from_snapshot(&corpus, result))
    }

    pub fn screen_opportunities(
        &self,
        request: &ScreenerRequest,
    ) -> Result<Analysis<ScreenerResult>, EngineError> {
        request.validate()?;
        if request.limit == 0 || request.limit > self.max_screener_limit {
            return Err(EngineError::InvalidInput(format!(
                "limit must be between 1 and {}",
                self.max_screener_limit
            )));
        }

        let corpus = self.store.snapshot();
        let result = screener::score_all_indications(&corpus, request, &self.opportunity_weights);
        Ok(Analysis::from_snapshot(&corpus, result))
    }

    pub fn size_market(
        &self,
        request: &MarketSizingRequest,
    ) -> Result<Analysis<MarketSizingResult>, EngineError> {
        request.validate()?;
        require_text("indication", &request.indication)?;
        require_text("geography", &request.geography)?;

        let corpus = self.store.snapshot();
        let result = market::size_market(&corpus, request);
        Ok(Analysis::from_snapshot(&corpus, result))
    }
}

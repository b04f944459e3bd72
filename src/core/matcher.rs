use std::collections::BTreeSet;
use crate::core::{
    filters::{is_excluded_company, meets_min_match_score},
    narrative::partner_rationale,
    resolver::{normalize, resolve},
    scoring::{clamp_0_to_100, clamp_unit, round1, weighted_average, FIT_BANDS},
    weights::PartnerWeights,
};
use crate::corpus::ReferenceCorpus;
use crate::models::{
    DealType, EntityKind, FinancialTier, MatchResult, PartnerMatchRequest, PartnerMatchResult,
    PartnerRecord, ScoreBreakdown, GLOBAL_GEOGRAPHY,
};

/// Focus share at which therapeutic alignment is maxed out
const FULL_ALIGNMENT_SHARE: f64 = 0.5;
/// Decay scale of the pipeline gap, in assets
const PIPELINE_GAP_SCALE: f64 = 2.0;
/// Years for a past deal's weight to halve
const DEAL_HALF_LIFE_YEARS: f64 = 3.0;
/// Saturation scale of the recency-weighted deal count
const DEAL_SATURATION: f64 = 2.0;
/// Matching strategic tags needed for a full score
const FULL_STRATEGIC_TAGS: f64 = 2.0;

/// What a request is looking for, resolved once per call
#[derive(Debug, Clone)]
pub struct PartnerQuery {
    pub indications: Vec<String>,
    /// Normalized therapy areas of the resolved indications
    pub therapy_areas: BTreeSet<String>,
    /// Normalized keywords checked against strategic priorities
    pub keywords: BTreeSet<String>,
    pub geographies: Vec<String>,
    pub deal_types: Vec<DealType>,
    pub as_of_year: i32,
}

impl PartnerQuery {
    pub fn build(corpus: &ReferenceCorpus, request: &PartnerMatchRequest, indications: Vec<String>) -> Self {
        let therapy_areas: BTreeSet<String> = indications
            .iter()
            .filter_map(|name| corpus.indication(name))
            .map(|record| normalize(&record.therapy_area))
            .collect();

        let mut keywords: BTreeSet<String> = BTreeSet::new();
        keywords.insert(normalize(&request.indication));
        keywords.extend(indications.iter().map(|name| normalize(name)));
        keywords.extend(therapy_areas.iter().cloned());
        for optional in [&request.mechanism, &request.modality].into_iter().flatten() {
            keywords.insert(normalize(optional));
        }
        keywords.retain(|k| !k.is_empty());

        Self {
            indications,
            therapy_areas,
            keywords,
            geographies: request.geography_rights.clone(),
            deal_types: request.deal_types.clone(),
            as_of_year: corpus.manifest().as_of_year,
        }
    }
}

/// Share of the partner's focus on the requested therapy areas; 50 % or more scores 100
pub fn therapeutic_alignment(partner: &PartnerRecord, therapy_areas: &BTreeSet<String>) -> f64 {
    let total: f64 = partner.therapeutic_focus.values().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let matched: f64 = partner
        .therapeutic_focus
        .iter()
        .filter(|(area, _)| therapy_areas.contains(&normalize(area)))
        .map(|(_, weight)| weight)
        .sum();
    100.0 * clamp_unit((matched / total) / FULL_ALIGNMENT_SHARE)
}

/// Fewer in-house assets in the indications means a bigger gap to fill
pub fn pipeline_gap(partner: &PartnerRecord, indications: &[String]) -> f64 {
    let assets: u32 = indications
        .iter()
        .filter_map(|name| partner.pipeline.get(name))
        .sum();
    100.0 * (-(assets as f64) / PIPELINE_GAP_SCALE).exp()
}

/// Recency-weighted count of past deals of the requested types
pub fn deal_history(partner: &PartnerRecord, deal_types: &[DealType], as_of_year: i32) -> f64 {
    let weight: f64 = partner
        .deal_history
        .iter()
        .filter(|deal| deal_types.contains(&deal.deal_type))
        .map(|deal| {
            let age = (as_of_year - deal.year).max(0) as f64;
            0.5_f64.powf(age / DEAL_HALF_LIFE_YEARS)
        })
        .sum();
    100.0 * (1.0 - (-weight / DEAL_SATURATION).exp())
}

pub fn financial_capacity(tier: FinancialTier) -> f64 {
    match tier {
        FinancialTier::Mega => 100.0,
        FinancialTier::Large => 80.0,
        FinancialTier::Mid => 55.0,
        FinancialTier::Small => 30.0,
    }
}

fn is_global(region: &str) -> bool {
    region.trim().eq_ignore_ascii_case(GLOBAL_GEOGRAPHY)
}

/// Fraction of requested regions the partner covers; "Global" on either side covers all
pub fn geography_fit(partner: &PartnerRecord, requested: &[String]) -> f64 {
    if requested.is_empty() || requested.iter().any(|r| is_global(r)) {
        return 100.0;
    }
    if partner.geographies.iter().any(|g| is_global(g)) {
        return 100.0;
    }

    let footprint: BTreeSet<String> = partner.geographies.iter().map(|g| normalize(g)).collect();
    let covered = requested
        .iter()
        .filter(|r| footprint.contains(&normalize(r)))
        .count();
    100.0 * covered as f64 / requested.len() as f64
}

fn tag_matches(tag: &str, keyword: &str) -> bool {
    tag == keyword || (tag.len() >= 3 && keyword.contains(tag)) || (keyword.len() >= 3 && tag.contains(keyword))
}

/// Strategic tags overlapping the query keywords; two matches score 100
pub fn strategic_priority(partner: &PartnerRecord, keywords: &BTreeSet<String>) -> f64 {
    let matching = partner
        .strategic_priorities
        .iter()
        .map(|tag| normalize(tag))
        .filter(|tag| !tag.is_empty() && keywords.iter().any(|k| tag_matches(tag, k)))
        .count();
    100.0 * (matching as f64 / FULL_STRATEGIC_TAGS).min(1.0)
}

/// Scores candidate partners for a licensing or co-development deal
///
/// # Pipeline
/// 1. Resolve the indication and derive therapy areas and keywords
/// 2. Score every active partner on the six sub-scores
/// 3. Rank, then apply exclusions and the minimum score
/// 4. Truncate to the requested limit
#[derive(Debug, Clone)]
pub struct PartnerMatcher {
    weights: PartnerWeights,
}

impl PartnerMatcher {
    pub fn new(weights: PartnerWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: PartnerWeights::default(),
        }
    }

    pub fn weights(&self) -> &PartnerWeights {
        &self.weights
    }

    pub fn score_breakdown(&self, partner: &PartnerRecord, query: &PartnerQuery) -> ScoreBreakdown {
        ScoreBreakdown {
            therapeutic_alignment: round1(therapeutic_alignment(partner, &query.therapy_areas)),
            pipeline_gap: round1(pipeline_gap(partner, &query.indications)),
            deal_history: round1(deal_history(partner, &query.deal_types, query.as_of_year)),
            financial_capacity: financial_capacity(partner.financial_tier),
            geography_fit: round1(geography_fit(partner, &query.geographies)),
            strategic_priority: round1(strategic_priority(partner, &query.keywords)),
        }
    }

    pub fn score_partner(&self, partner: &PartnerRecord, query: &PartnerQuery) -> MatchResult {
        let breakdown = self.score_breakdown(partner, query);
        let match_score = round1(clamp_0_to_100(weighted_average(
            &breakdown.as_array(),
            &self.weights.as_array(),
        )));

        MatchResult {
            company: partner.company.clone(),
            match_score,
            fit_label: FIT_BANDS.label(match_score).to_string(),
            rationale: partner_rationale(&partner.company, &breakdown),
            score_breakdown: breakdown,
        }
    }

    /// Find and rank partners for a deal request
    pub fn find_matches(&self, corpus: &ReferenceCorpus, request: &PartnerMatchRequest) -> PartnerMatchResult {
        let resolution = resolve(corpus, &request.indication, EntityKind::Indication);
        let query = PartnerQuery::build(corpus, request, resolution.entities().to_vec());

        let mut scored: Vec<MatchResult> = corpus
            .partners()
            .iter()
            .filter(|partner| partner.active)
            .map(|partner| self.score_partner(partner, &query))
            .collect();
        let scored_count = scored.len();

        // Score desc, then deal history desc, then company name
        scored.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| {
                    b.score_breakdown
                        .deal_history
                        .total_cmp(&a.score_breakdown.deal_history)
                })
                .then_with(|| a.company.cmp(&b.company))
        });

        scored.retain(|m| {
            !is_excluded_company(&m.company, &request.exclude_companies)
                && meets_min_match_score(m.match_score, request.minimum_match_score)
        });
        let total_matches = scored.len();

        if let Some(limit) = request.limit {
            scored.truncate(limit);
        }

        tracing::debug!(
            "Partner match for '{}': {} scored, {} after filters, {} returned",
            request.indication,
            scored_count,
            total_matches,
            scored.len()
        );

        PartnerMatchResult {
            partners: scored,
            total_matches,
            resolution: resolution.summary(),
        }
    }
}

impl Default for PartnerMatcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

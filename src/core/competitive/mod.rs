//! Competitive landscape analysis shared by the pharma, device and
//! diagnostic variants.
//!
//! Each variant resolves its entity, gathers and filters competitors and
//! builds its white-space catalogue; everything else (crowding, platform
//! table, market share, comparison matrix, summary) is assembled here.

pub mod device;
pub mod diagnostic;
pub mod pharma;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use crate::core::narrative::{self, InsightContext};
use crate::core::resolver::Resolution;
use crate::core::scoring::{
    clamp_0_to_100, clamp_1_to_10, herfindahl_index, mean, round1, saturation,
    CONCENTRATION_BANDS, CROWDING_BANDS,
};
use crate::core::weights::{
    CROWDING_CLUSTER_BONUS, CROWDING_CLUSTER_WIDTH, CROWDING_SATURATION_COUNT,
};
use crate::models::{
    ComparisonMatrix, Competitor, CompetitorEntry, CompetitorLists, CompetitiveLandscapeResult,
    CompetitorProfile, LandscapeKind, LandscapeSummary, MarketShareDistribution,
    MarketShareEntry, PlatformComparisonRow, ShareBasis, WhiteSpaceOpportunity,
};

/// Competitors shown in the comparison matrix
pub const MATRIX_COMPETITORS: usize = 12;

/// White-space segments returned per landscape
pub const MAX_WHITE_SPACE: usize = 5;

/// Segments at or below this coverage count as white space
const WHITE_SPACE_MAX_COVERAGE: usize = 1;

/// Segment used when a catalogue comes up empty
const FIRST_ENTRANT_SEGMENT: &str = "first-in-class entry";

const NO_PLATFORM: &str = "no established platform";

/// Variant-specific rendering of a competitor
pub trait LandscapeRow: Competitor {
    /// List entry, with `mapped_to` limited to the resolved entities
    fn entry(&self, resolution: &Resolution) -> CompetitorEntry;

    /// Variant attributes added to the comparison matrix
    fn matrix_attributes(&self) -> Vec<(&'static str, String)>;
}

/// Candidate segment for white-space ranking
#[derive(Debug, Clone, PartialEq)]
pub struct WhiteSpaceSegment {
    pub name: String,
    pub coverage: usize,
    /// Attractiveness before coverage, 1-10
    pub base: f64,
}

/// Penetration figure reported in the summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Penetration {
    Market(Option<f64>),
    Testing(Option<f64>),
}

/// Stage-weighted crowding on the 1-10 scale.
///
/// Saturating in the stage-weighted count, plus a bonus that grows with the
/// largest group of competitors whose differentiation scores sit within
/// `CROWDING_CLUSTER_WIDTH` of each other (a me-too field). Both terms only
/// grow as competitors are added.
pub fn crowding_score<C: Competitor + ?Sized>(competitors: &[&C]) -> f64 {
    if competitors.is_empty() {
        return 1.0;
    }

    let weighted: f64 = competitors.iter().map(|c| c.stage_weight().max(0.0)).sum();
    let base = 1.0 + 9.0 * saturation(weighted, CROWDING_SATURATION_COUNT);

    let differentiation: Vec<f64> = competitors
        .iter()
        .map(|c| c.profile().differentiation_score)
        .collect();
    let cluster = largest_cluster(&differentiation, CROWDING_CLUSTER_WIDTH);
    let bonus = CROWDING_CLUSTER_BONUS
        * saturation(cluster.saturating_sub(1) as f64, CROWDING_SATURATION_COUNT);

    round1(clamp_1_to_10(base + bonus))
}

/// Size of the largest group of values spanning at most `width`
fn largest_cluster(values: &[f64], width: f64) -> usize {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut largest = 0;
    let mut start = 0;
    for end in 0..sorted.len() {
        while sorted[end] - sorted[start] > width {
            start += 1;
        }
        largest = largest.max(end - start + 1);
    }
    largest
}

/// Leading platform of an already ordered comparison
pub fn dominant_platform(rows: &[PlatformComparisonRow]) -> String {
    rows.first()
        .map(|row| row.platform.clone())
        .unwrap_or_else(|| NO_PLATFORM.to_string())
}

pub fn platform_comparison<C: Competitor + ?Sized>(competitors: &[&C]) -> Vec<PlatformComparisonRow> {
    let mut groups: BTreeMap<&str, Vec<&CompetitorProfile>> = BTreeMap::new();
    for competitor in competitors {
        let profile = competitor.profile();
        groups.entry(profile.platform.as_str()).or_default().push(profile);
    }

    let mut rows: Vec<PlatformComparisonRow> = groups
        .into_iter()
        .map(|(platform, profiles)| {
            let differentiation: Vec<f64> = profiles.iter().map(|p| p.differentiation_score).collect();
            let evidence: Vec<f64> = profiles.iter().map(|p| p.evidence_strength).collect();
            let companies: BTreeSet<&str> = profiles.iter().map(|p| p.company.as_str()).collect();

            PlatformComparisonRow {
                platform: platform.to_string(),
                competitor_count: profiles.len(),
                approved_count: profiles.iter().filter(|p| p.status.is_approved()).count(),
                avg_differentiation: round1(mean(&differentiation)),
                avg_evidence_strength: round1(mean(&evidence)),
                companies: companies.into_iter().map(str::to_string).collect(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.competitor_count
            .cmp(&a.competitor_count)
            .then_with(|| b.approved_count.cmp(&a.approved_count))
            .then_with(|| a.platform.cmp(&b.platform))
    });
    rows
}

/// Share distribution and HHI, aggregated by company.
///
/// Reported shares are used as-is when they already sum to ~100 and are
/// rescaled to 100 otherwise. Without any share data the approved
/// competitors (or every competitor if none is approved) split equally.
pub fn market_share_distribution<C: Competitor + ?Sized>(competitors: &[&C]) -> MarketShareDistribution {
    if competitors.is_empty() {
        return MarketShareDistribution {
            entries: vec![],
            hhi_index: 0.0,
            concentration_label: CONCENTRATION_BANDS.label(0.0).to_string(),
            basis: ShareBasis::NoCompetitors,
        };
    }

    let mut reported: BTreeMap<&str, f64> = BTreeMap::new();
    for competitor in competitors {
        if let Some(share) = competitor.market_share_pct() {
            *reported.entry(competitor.profile().company.as_str()).or_insert(0.0) += share;
        }
    }
    let reported_total: f64 = reported.values().sum();

    let (shares, basis) = if reported_total > 0.0 {
        let basis = if (reported_total - 100.0).abs() < 0.5 {
            ShareBasis::Reported
        } else {
            ShareBasis::Normalized
        };
        let shares: BTreeMap<&str, f64> = reported
            .into_iter()
            .map(|(company, share)| (company, share * 100.0 / reported_total))
            .collect();
        (shares, basis)
    } else {
        let approved: Vec<&&C> = competitors.iter().filter(|c| c.profile().status.is_approved()).collect();
        let pool: Vec<&&C> = if approved.is_empty() { competitors.iter().collect() } else { approved };
        let each = 100.0 / pool.len() as f64;

        let mut shares: BTreeMap<&str, f64> = BTreeMap::new();
        for competitor in pool {
            *shares.entry(competitor.profile().company.as_str()).or_insert(0.0) += each;
        }
        (shares, ShareBasis::EqualSplit)
    };

    let values: Vec<f64> = shares.values().copied().collect();
    let hhi = round1(herfindahl_index(&values));

    let mut entries: Vec<MarketShareEntry> = shares
        .into_iter()
        .map(|(company, share)| MarketShareEntry {
            company: company.to_string(),
            share_pct: round1(share),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.share_pct
            .total_cmp(&a.share_pct)
            .then_with(|| a.company.cmp(&b.company))
    });

    MarketShareDistribution {
        entries,
        hhi_index: hhi,
        concentration_label: CONCENTRATION_BANDS.label(hhi).to_string(),
        basis,
    }
}

/// Approved first, then differentiation desc, then label
fn matrix_order(a: &CompetitorProfile, b: &CompetitorProfile) -> Ordering {
    b.status
        .is_approved()
        .cmp(&a.status.is_approved())
        .then_with(|| b.differentiation_score.total_cmp(&a.differentiation_score))
        .then_with(|| a.label().cmp(&b.label()))
}

pub fn comparison_matrix<C: LandscapeRow>(competitors: &[&C]) -> ComparisonMatrix {
    let mut ordered: Vec<&C> = competitors.to_vec();
    ordered.sort_by(|a, b| matrix_order(a.profile(), b.profile()));
    ordered.truncate(MATRIX_COMPETITORS);

    let mut matrix = ComparisonMatrix::new();
    for competitor in ordered {
        let profile = competitor.profile();
        let label = profile.label();

        let mut attributes = vec![
            ("company", profile.company.clone()),
            ("status", profile.status.as_str().to_string()),
            ("platform", profile.platform.clone()),
            ("differentiation_score", format!("{:.1}", profile.differentiation_score)),
            ("evidence_strength", format!("{:.1}", profile.evidence_strength)),
        ];
        attributes.extend(competitor.matrix_attributes());

        for (attribute, value) in attributes {
            matrix
                .entry(attribute.to_string())
                .or_default()
                .insert(label.clone(), value);
        }
    }
    matrix
}

/// Rank white-space segments: base / (1 + coverage), best first.
///
/// Segments with coverage <= 1 qualify; when none do, the least covered
/// segments are returned instead, so the list is never empty.
pub fn rank_white_space(mut segments: Vec<WhiteSpaceSegment>) -> Vec<WhiteSpaceOpportunity> {
    if segments.is_empty() {
        segments.push(WhiteSpaceSegment {
            name: FIRST_ENTRANT_SEGMENT.to_string(),
            coverage: 0,
            base: 5.0,
        });
    }

    let qualifying: Vec<WhiteSpaceSegment> = segments
        .iter()
        .filter(|s| s.coverage <= WHITE_SPACE_MAX_COVERAGE)
        .cloned()
        .collect();
    let candidates = if qualifying.is_empty() {
        let least = segments.iter().map(|s| s.coverage).min().unwrap_or(0);
        segments.into_iter().filter(|s| s.coverage == least).collect()
    } else {
        qualifying
    };

    let mut ranked: Vec<WhiteSpaceOpportunity> = candidates
        .into_iter()
        .map(|segment| {
            let score = round1(clamp_1_to_10(segment.base) / (1.0 + segment.coverage as f64));
            WhiteSpaceOpportunity {
                rationale: narrative::white_space_rationale(&segment.name, segment.coverage, score),
                segment: segment.name,
                coverage: segment.coverage,
                opportunity_score: score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.opportunity_score
            .total_cmp(&a.opportunity_score)
            .then_with(|| a.segment.cmp(&b.segment))
    });
    ranked.truncate(MAX_WHITE_SPACE);
    ranked
}

/// Subject of narrative text for a resolution
pub fn subject(resolution: &Resolution, kind_plural: &str) -> String {
    match resolution {
        Resolution::NoMatch { .. } => format!("The tracked {} corpus", kind_plural),
        Resolution::Exact(names) | Resolution::Fuzzy(names) => match names.as_slice() {
            [] => format!("The tracked {} corpus", kind_plural),
            [one] => one.clone(),
            [first, second] => format!("{} and {}", first, second),
            [first, rest @ ..] => format!("{} and {} related {}", first, rest.len(), kind_plural),
        },
    }
}

fn entry_order(a: &CompetitorEntry, b: &CompetitorEntry) -> Ordering {
    b.differentiation_score
        .total_cmp(&a.differentiation_score)
        .then_with(|| b.evidence_strength.total_cmp(&a.evidence_strength))
        .then_with(|| a.product.cmp(&b.product))
        .then_with(|| a.company.cmp(&b.company))
}

/// Filtered competitors plus what the variant knows about its landscape
pub struct LandscapeInput<'a, C> {
    pub kind: LandscapeKind,
    pub query: &'a str,
    pub resolution: &'a Resolution,
    pub competitors: Vec<&'a C>,
    pub white_space: Vec<WhiteSpaceSegment>,
    pub penetration: Penetration,
    /// Plural noun for narrative text, e.g. "indications"
    pub entity_plural: &'a str,
}

pub fn assemble<C: LandscapeRow>(input: LandscapeInput<'_, C>) -> CompetitiveLandscapeResult {
    let LandscapeInput {
        kind,
        query,
        resolution,
        competitors,
        white_space,
        penetration,
        entity_plural,
    } = input;

    let crowding = crowding_score(&competitors);
    let crowding_label = CROWDING_BANDS.label(crowding);
    let platforms = platform_comparison(&competitors);
    let dominant = dominant_platform(&platforms);

    let market_share = match kind {
        LandscapeKind::Pharma => None,
        LandscapeKind::Device | LandscapeKind::Diagnostic => Some(market_share_distribution(&competitors)),
    };

    let (mut approved, mut pipeline): (Vec<CompetitorEntry>, Vec<CompetitorEntry>) = competitors
        .iter()
        .map(|c| c.entry(resolution))
        .partition(|entry| entry.status.is_approved());
    approved.sort_by(entry_order);
    pipeline.sort_by(entry_order);

    let white_space = rank_white_space(white_space);
    let subject = subject(resolution, entity_plural);
    let key_insight = narrative::key_insight(&InsightContext {
        subject: &subject,
        crowding_score: crowding,
        crowding_label,
        dominant_platform: &dominant,
        approved: approved.len(),
        pipeline: pipeline.len(),
        top_white_space: white_space.first().map(|w| w.segment.as_str()),
        concentration: market_share
            .as_ref()
            .filter(|m| m.basis != ShareBasis::NoCompetitors)
            .map(|m| m.concentration_label.as_str()),
    });

    let (testing_penetration_pct, market_penetration_pct) = match penetration {
        Penetration::Market(value) => (None, value.map(|v| round1(clamp_0_to_100(v)))),
        Penetration::Testing(value) => (value.map(|v| round1(clamp_0_to_100(v))), None),
    };

    let summary = LandscapeSummary {
        crowding_score: crowding,
        crowding_label: crowding_label.to_string(),
        dominant_platform: dominant,
        testing_penetration_pct,
        market_penetration_pct,
        total_competitors: approved.len() + pipeline.len(),
        approved_count: approved.len(),
        pipeline_count: pipeline.len(),
        key_insight,
        white_space,
    };

    let competitor_lists = match kind {
        LandscapeKind::Pharma => CompetitorLists::Pharma {
            approved_drugs: approved,
            pipeline_drugs: pipeline,
        },
        LandscapeKind::Device => CompetitorLists::Device {
            cleared_devices: approved,
            pipeline_devices: pipeline,
        },
        LandscapeKind::Diagnostic => CompetitorLists::Diagnostic {
            approved_tests: approved,
            pipeline_tests: pipeline,
        },
    };

    tracing::debug!(
        "{:?} landscape for '{}': {} competitors, crowding {}",
        kind,
        query,
        competitor_lists.len(),
        crowding
    );

    CompetitiveLandscapeResult {
        landscape: kind,
        query: query.to_string(),
        resolution: resolution.summary(),
        summary,
        comparison_matrix: comparison_matrix(&competitors),
        competitors: competitor_lists,
        platform_comparison: platforms,
        market_share,
    }
}

/// Shared profile fields of a list entry
pub(crate) fn base_entry(profile: &CompetitorProfile, mapped_to: Vec<String>) -> CompetitorEntry {
    CompetitorEntry {
        company: profile.company.clone(),
        product: profile.product.clone(),
        status: profile.status,
        platform: profile.platform.clone(),
        differentiation_score: round1(clamp_1_to_10(profile.differentiation_score)),
        evidence_strength: round1(clamp_1_to_10(profile.evidence_strength)),
        stage: None,
        modality: None,
        category: None,
        market_share_pct: None,
        mapped_to,
    }
}

/// Mappings of a competitor that fall inside the resolution
pub(crate) fn mapped_within(mappings: &[String], resolution: &Resolution) -> Vec<String> {
    if resolution.is_fallback() {
        return mappings.to_vec();
    }
    mappings
        .iter()
        .filter(|m| resolution.contains(m))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DevelopmentStage, DeviceCompetitor, PharmaCompetitor, RegulatoryStatus};

    fn drug(company: &str, stage: DevelopmentStage, differentiation: f64) -> PharmaCompetitor {
        PharmaCompetitor {
            profile: CompetitorProfile {
                company: company.to_string(),
                product: format!("{}-101", company),
                status: if stage == DevelopmentStage::Approved {
                    RegulatoryStatus::Approved
                } else {
                    RegulatoryStatus::Pipeline
                },
                platform: "PD-1 inhibitor".to_string(),
                differentiation_score: differentiation,
                evidence_strength: 5.0,
            },
            indications: vec!["Melanoma".to_string()],
            stage,
            modality: "monoclonal antibody".to_string(),
        }
    }

    fn device(company: &str, approved: bool, differentiation: f64, share: Option<f64>) -> DeviceCompetitor {
        DeviceCompetitor {
            profile: CompetitorProfile {
                company: company.to_string(),
                product: format!("{} Device", company),
                status: if approved { RegulatoryStatus::Approved } else { RegulatoryStatus::Pipeline },
                platform: "balloon-expandable valve".to_string(),
                differentiation_score: differentiation,
                evidence_strength: 6.0,
            },
            procedures: vec!["TAVR".to_string()],
            device_category: "valve".to_string(),
            sub_types: vec![],
            market_share_pct: share,
        }
    }

    #[test]
    fn test_crowding_empty_is_minimum() {
        let none: Vec<&DeviceCompetitor> = vec![];
        assert_eq!(crowding_score(&none), 1.0);
    }

    #[test]
    fn test_crowding_is_monotonic_in_competitor_count() {
        let pool: Vec<DeviceCompetitor> = (0..30)
            .map(|i| device(&format!("Co{:02}", i), true, 6.0, None))
            .collect();
        let mut previous = 1.0;
        for n in 1..=pool.len() {
            let refs: Vec<&DeviceCompetitor> = pool.iter().take(n).collect();
            let score = crowding_score(&refs);
            assert!(score >= previous, "crowding dropped at n = {}", n);
            assert!((1.0..=10.0).contains(&score));
            previous = score;
        }
        assert!(previous > 9.0);
    }

    #[test]
    fn test_outlier_pipeline_entrant_never_lowers_crowding() {
        let mut pool: Vec<PharmaCompetitor> = (0..5)
            .map(|i| drug(&format!("Approved{}", i), DevelopmentStage::Approved, 6.0))
            .collect();
        let before = crowding_score(&pool.iter().collect::<Vec<_>>());

        pool.push(drug("Outlier", DevelopmentStage::Phase1, 1.0));
        let after = crowding_score(&pool.iter().collect::<Vec<_>>());
        assert!(after >= before, "crowding dropped from {} to {}", before, after);
    }

    #[test]
    fn test_crowding_never_drops_as_mixed_competitors_arrive() {
        let stages = [
            DevelopmentStage::Approved,
            DevelopmentStage::Preclinical,
            DevelopmentStage::Phase3,
            DevelopmentStage::Phase1,
            DevelopmentStage::Filed,
            DevelopmentStage::Phase2,
        ];
        let differentiation = [6.0, 1.0, 9.5, 6.5, 3.0, 10.0, 5.5, 2.0, 7.0];
        let pool: Vec<PharmaCompetitor> = (0..40)
            .map(|i| {
                drug(
                    &format!("Co{:02}", i),
                    stages[i % stages.len()],
                    differentiation[(i * 7) % differentiation.len()],
                )
            })
            .collect();

        let mut previous = 1.0;
        for n in 1..=pool.len() {
            let refs: Vec<&PharmaCompetitor> = pool.iter().take(n).collect();
            let score = crowding_score(&refs);
            assert!(score >= previous, "crowding dropped from {} to {} at n = {}", previous, score, n);
            assert!((1.0..=10.0).contains(&score));
            previous = score;
        }
    }

    #[test]
    fn test_largest_cluster() {
        assert_eq!(largest_cluster(&[], 2.0), 0);
        assert_eq!(largest_cluster(&[6.0], 2.0), 1);
        assert_eq!(largest_cluster(&[1.0, 4.0, 7.0, 10.0], 2.0), 1);
        assert_eq!(largest_cluster(&[5.0, 7.0, 6.0, 9.5, 1.0], 2.0), 3);
    }

    #[test]
    fn test_clustered_differentiation_crowds_more() {
        let tight: Vec<DeviceCompetitor> = (0..4).map(|i| device(&format!("T{}", i), true, 6.0, None)).collect();
        let spread: Vec<DeviceCompetitor> = [1.0, 4.0, 7.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, d)| device(&format!("S{}", i), true, *d, None))
            .collect();
        let tight_refs: Vec<&DeviceCompetitor> = tight.iter().collect();
        let spread_refs: Vec<&DeviceCompetitor> = spread.iter().collect();
        assert!(crowding_score(&tight_refs) > crowding_score(&spread_refs));
    }

    #[test]
    fn test_market_share_reported() {
        let pool = vec![device("A", true, 5.0, Some(60.0)), device("B", true, 5.0, Some(40.0))];
        let refs: Vec<&DeviceCompetitor> = pool.iter().collect();
        let distribution = market_share_distribution(&refs);
        assert_eq!(distribution.basis, ShareBasis::Reported);
        assert_eq!(distribution.hhi_index, 5200.0);
        assert_eq!(distribution.concentration_label, "Monopolistic");
        assert_eq!(distribution.entries[0].company, "A");
    }

    #[test]
    fn test_market_share_partial_data_is_normalized() {
        let pool = vec![
            device("A", true, 5.0, Some(30.0)),
            device("B", true, 5.0, Some(30.0)),
            device("C", true, 5.0, None),
        ];
        let refs: Vec<&DeviceCompetitor> = pool.iter().collect();
        let distribution = market_share_distribution(&refs);
        assert_eq!(distribution.basis, ShareBasis::Normalized);
        assert_eq!(distribution.entries.len(), 2);
        assert_eq!(distribution.entries[0].share_pct, 50.0);
        assert_eq!(distribution.hhi_index, 5000.0);
    }

    #[test]
    fn test_market_share_equal_split_by_company() {
        let pool = vec![
            device("A", true, 5.0, None),
            device("A", true, 6.0, None),
            device("B", true, 5.0, None),
            device("C", true, 5.0, None),
            device("D", false, 5.0, None),
        ];
        let refs: Vec<&DeviceCompetitor> = pool.iter().collect();
        let distribution = market_share_distribution(&refs);
        assert_eq!(distribution.basis, ShareBasis::EqualSplit);
        // A holds two of four approved products
        assert_eq!(distribution.entries[0].company, "A");
        assert_eq!(distribution.entries[0].share_pct, 50.0);
        assert_eq!(distribution.hhi_index, 3750.0);
        assert_eq!(distribution.concentration_label, "Highly Concentrated");
    }

    #[test]
    fn test_market_share_without_competitors() {
        let none: Vec<&DeviceCompetitor> = vec![];
        let distribution = market_share_distribution(&none);
        assert_eq!(distribution.basis, ShareBasis::NoCompetitors);
        assert_eq!(distribution.hhi_index, 0.0);
    }

    #[test]
    fn test_white_space_prefers_uncovered_segments() {
        let segments = vec![
            WhiteSpaceSegment { name: "b".to_string(), coverage: 0, base: 8.0 },
            WhiteSpaceSegment { name: "a".to_string(), coverage: 0, base: 8.0 },
            WhiteSpaceSegment { name: "c".to_string(), coverage: 1, base: 8.0 },
            WhiteSpaceSegment { name: "d".to_string(), coverage: 5, base: 8.0 },
        ];
        let ranked = rank_white_space(segments);
        let names: Vec<&str> = ranked.iter().map(|w| w.segment.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(ranked[0].opportunity_score, 8.0);
        assert_eq!(ranked[2].opportunity_score, 4.0);
    }

    #[test]
    fn test_white_space_falls_back_to_least_covered() {
        let segments = vec![
            WhiteSpaceSegment { name: "x".to_string(), coverage: 4, base: 6.0 },
            WhiteSpaceSegment { name: "y".to_string(), coverage: 2, base: 6.0 },
            WhiteSpaceSegment { name: "z".to_string(), coverage: 2, base: 6.0 },
        ];
        let ranked = rank_white_space(segments);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|w| w.coverage == 2));
        assert!(!rank_white_space(vec![]).is_empty());
    }

    #[test]
    fn test_platform_comparison_order() {
        let mut a = device("A", true, 5.0, None);
        a.profile.platform = "self-expanding valve".to_string();
        let b = device("B", true, 7.0, None);
        let c = device("C", false, 9.0, None);
        let pool = vec![a, b, c];
        let refs: Vec<&DeviceCompetitor> = pool.iter().collect();
        let rows = platform_comparison(&refs);
        assert_eq!(rows[0].platform, "balloon-expandable valve");
        assert_eq!(rows[0].competitor_count, 2);
        assert_eq!(rows[0].avg_differentiation, 8.0);
        assert_eq!(dominant_platform(&rows), "balloon-expandable valve");
        assert_eq!(dominant_platform(&[]), NO_PLATFORM);
    }

    #[test]
    fn test_subject_wording() {
        assert_eq!(subject(&Resolution::Exact(vec!["TAVR".to_string()]), "procedures"), "TAVR");
        assert_eq!(
            subject(&Resolution::NoMatch { fallback: vec![] }, "biomarkers"),
            "The tracked biomarkers corpus"
        );
    }
}

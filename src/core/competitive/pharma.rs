use std::collections::BTreeMap;
use crate::core::competitive::{
    self, base_entry, mapped_within, LandscapeInput, LandscapeRow, Penetration, WhiteSpaceSegment,
};
use crate::core::filters::matches_pharma_request;
use crate::core::resolver::{normalize, resolve, Resolution};
use crate::core::scoring::mean;
use crate::corpus::ReferenceCorpus;
use crate::models::{
    CompetitiveLandscapeResult, CompetitorEntry, EntityKind, LandscapeKind, PharmaCompetitor,
    PharmaLandscapeRequest,
};

/// Modalities always considered for white space, on top of those observed
pub const MODALITY_CATALOGUE: &[&str] = &[
    "small molecule",
    "monoclonal antibody",
    "bispecific antibody",
    "antibody-drug conjugate",
    "cell therapy",
    "gene therapy",
    "siRNA",
    "antisense oligonucleotide",
    "mRNA",
    "radioligand",
    "peptide",
    "vaccine",
];

impl LandscapeRow for PharmaCompetitor {
    fn entry(&self, resolution: &Resolution) -> CompetitorEntry {
        CompetitorEntry {
            stage: Some(self.stage),
            modality: Some(self.modality.clone()),
            ..base_entry(&self.profile, mapped_within(&self.indications, resolution))
        }
    }

    fn matrix_attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("stage", self.stage.as_str().to_string()),
            ("modality", self.modality.clone()),
            ("indications", self.indications.join("; ")),
        ]
    }
}

/// Pharma competitive landscape for a free-text indication
pub fn analyze(corpus: &ReferenceCorpus, request: &PharmaLandscapeRequest) -> CompetitiveLandscapeResult {
    let resolution = resolve(corpus, &request.indication, EntityKind::Indication);
    let mapped = corpus.pharma_for(resolution.entities());

    let competitors: Vec<&PharmaCompetitor> = mapped
        .iter()
        .copied()
        .filter(|c| matches_pharma_request(c, request))
        .collect();
    tracing::debug!(
        "Pharma filters kept {} of {} competitors for '{}'",
        competitors.len(),
        mapped.len(),
        request.indication
    );

    let records: Vec<_> = resolution
        .entities()
        .iter()
        .filter_map(|name| corpus.indication(name))
        .collect();
    let unmet_need: Vec<f64> = records.iter().map(|r| r.unmet_need).collect();
    let treated: Vec<f64> = records.iter().map(|r| r.treated_pct).collect();

    let base = if unmet_need.is_empty() { 5.0 } else { mean(&unmet_need) };
    let white_space = modality_segments(&mapped, base);
    let penetration = Penetration::Market((!treated.is_empty()).then(|| mean(&treated)));

    competitive::assemble(LandscapeInput {
        kind: LandscapeKind::Pharma,
        query: &request.indication,
        resolution: &resolution,
        competitors,
        white_space,
        penetration,
        entity_plural: "indications",
    })
}

/// Modality segments with their coverage in the unfiltered landscape
fn modality_segments(mapped: &[&PharmaCompetitor], base: f64) -> Vec<WhiteSpaceSegment> {
    let mut segments: BTreeMap<String, (String, usize)> = MODALITY_CATALOGUE
        .iter()
        .map(|m| (normalize(m), (m.to_string(), 0)))
        .collect();

    for competitor in mapped {
        segments
            .entry(normalize(&competitor.modality))
            .or_insert_with(|| (competitor.modality.clone(), 0))
            .1 += 1;
    }

    segments
        .into_values()
        .map(|(name, coverage)| WhiteSpaceSegment { name, coverage, base })
        .collect()
}

/// Crowding score of the unfiltered pharma landscape of some indications
pub fn crowding_for(corpus: &ReferenceCorpus, indications: &[String]) -> f64 {
    competitive::crowding_score(&corpus.pharma_for(indications))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DevelopmentStage, MatchKind};

    fn corpus() -> ReferenceCorpus {
        ReferenceCorpus::embedded().unwrap()
    }

    #[test]
    fn test_nsclc_landscape() {
        let corpus = corpus();
        let result = analyze(&corpus, &PharmaLandscapeRequest::new("NSCLC"));

        assert_eq!(result.resolution.match_kind, MatchKind::Exact);
        assert_eq!(result.resolution.entities, vec!["Non-Small Cell Lung Cancer".to_string()]);
        assert!(!result.competitors.approved().is_empty());
        assert!(result.summary.crowding_score >= 6.0);
        assert!(result.market_share.is_none());
        assert!(result.summary.market_penetration_pct.is_some());
        assert!(!result.summary.white_space.is_empty());
        assert!(result
            .competitors
            .approved()
            .iter()
            .all(|e| e.mapped_to.contains(&"Non-Small Cell Lung Cancer".to_string())));
    }

    #[test]
    fn test_filters_only_shrink_the_lists() {
        let corpus = corpus();
        let all = analyze(&corpus, &PharmaLandscapeRequest::new("NSCLC"));

        let mut request = PharmaLandscapeRequest::new("NSCLC");
        request.min_stage = Some(DevelopmentStage::Phase3);
        request.modality = Some("small molecule".to_string());
        let narrowed = analyze(&corpus, &request);

        assert!(narrowed.competitors.len() <= all.competitors.len());
        assert!(narrowed
            .competitors
            .pipeline()
            .iter()
            .all(|e| e.stage >= Some(DevelopmentStage::Phase3)));
        // White space is judged on the whole landscape
        assert_eq!(narrowed.summary.white_space, all.summary.white_space);
    }

    #[test]
    fn test_unknown_indication_falls_back() {
        let corpus = corpus();
        let result = analyze(&corpus, &PharmaLandscapeRequest::new("TOTALLY_UNKNOWN_XYZ"));
        assert_eq!(result.resolution.match_kind, MatchKind::NoMatch);
        assert_eq!(result.resolution.entities.len(), corpus.indications().len());
        assert!(result.summary.key_insight.len() > 20);
        assert!((1.0..=10.0).contains(&result.summary.crowding_score));
    }

    #[test]
    fn test_crowding_for_matches_unfiltered_landscape() {
        let corpus = corpus();
        let result = analyze(&corpus, &PharmaLandscapeRequest::new("Melanoma"));
        let crowding = crowding_for(&corpus, &result.resolution.entities);
        assert_eq!(crowding, result.summary.crowding_score);
    }

    #[test]
    fn test_matrix_is_capped() {
        let corpus = corpus();
        let result = analyze(&corpus, &PharmaLandscapeRequest::new("NSCLC"));
        for column in result.comparison_matrix.values() {
            assert!(column.len() <= competitive::MATRIX_COMPETITORS);
        }
        assert!(result.comparison_matrix.contains_key("modality"));
    }
}

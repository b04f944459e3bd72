use std::collections::BTreeMap;
use crate::core::competitive::{
    self, base_entry, mapped_within, LandscapeInput, LandscapeRow, Penetration, WhiteSpaceSegment,
};
use crate::core::filters::matches_diagnostic_request;
use crate::core::resolver::{normalize, resolve, Resolution};
use crate::core::scoring::mean;
use crate::corpus::ReferenceCorpus;
use crate::models::{
    BiomarkerRecord, CompetitiveLandscapeResult, CompetitorEntry, DiagnosticCompetitor,
    DiagnosticLandscapeRequest, EntityKind, LandscapeKind,
};

/// Test types combined with each biomarker when looking for white space
pub const TEST_TYPE_CATALOGUE: &[&str] = &["IHC", "NGS", "PCR", "FISH", "liquid biopsy", "immunoassay"];

impl LandscapeRow for DiagnosticCompetitor {
    fn entry(&self, resolution: &Resolution) -> CompetitorEntry {
        CompetitorEntry {
            category: Some(self.test_type.clone()),
            market_share_pct: self.market_share_pct,
            ..base_entry(&self.profile, mapped_within(&self.biomarkers, resolution))
        }
    }

    fn matrix_attributes(&self) -> Vec<(&'static str, String)> {
        let linked = if self.linked_drugs.is_empty() {
            "none".to_string()
        } else {
            self.linked_drugs.join("; ")
        };
        let share = self
            .market_share_pct
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "n/a".to_string());

        vec![
            ("test_type", self.test_type.clone()),
            ("biomarkers", self.biomarkers.join("; ")),
            ("linked_drugs", linked),
            ("market_share_pct", share),
        ]
    }
}

/// Diagnostic / companion diagnostic landscape for a free-text biomarker
pub fn analyze(
    corpus: &ReferenceCorpus,
    request: &DiagnosticLandscapeRequest,
) -> CompetitiveLandscapeResult {
    let resolution = resolve(corpus, &request.biomarker, EntityKind::Biomarker);
    let mapped = corpus.diagnostics_for(resolution.entities());

    let indication = request
        .indication
        .as_deref()
        .map(|text| resolve(corpus, text, EntityKind::Indication));
    if let Some(Resolution::NoMatch { .. }) = &indication {
        tracing::warn!(
            "Ignoring unresolved indication filter on diagnostic landscape for '{}'",
            request.biomarker
        );
    }

    let competitors: Vec<&DiagnosticCompetitor> = mapped
        .iter()
        .copied()
        .filter(|c| matches_diagnostic_request(c, request, indication.as_ref()))
        .collect();
    tracing::debug!(
        "Diagnostic filters kept {} of {} competitors for '{}'",
        competitors.len(),
        mapped.len(),
        request.biomarker
    );

    let biomarkers: Vec<&BiomarkerRecord> = resolution
        .entities()
        .iter()
        .filter_map(|name| corpus.biomarker(name))
        .collect();
    let testing: Vec<f64> = biomarkers.iter().map(|b| b.testing_penetration_pct).collect();
    let penetration = (!testing.is_empty()).then(|| mean(&testing));
    let white_space = test_type_segments(&biomarkers, &mapped);

    competitive::assemble(LandscapeInput {
        kind: LandscapeKind::Diagnostic,
        query: &request.biomarker,
        resolution: &resolution,
        competitors,
        white_space,
        penetration: Penetration::Testing(penetration),
        entity_plural: "biomarkers",
    })
}

/// Biomarker x test-type segments, scored on each biomarker's untested share
fn test_type_segments(
    biomarkers: &[&BiomarkerRecord],
    mapped: &[&DiagnosticCompetitor],
) -> Vec<WhiteSpaceSegment> {
    let mut segments = Vec::new();

    for biomarker in biomarkers {
        let tests: Vec<&DiagnosticCompetitor> = mapped
            .iter()
            .copied()
            .filter(|c| c.biomarkers.contains(&biomarker.name))
            .collect();

        let mut test_types: BTreeMap<String, String> = TEST_TYPE_CATALOGUE
            .iter()
            .map(|t| (normalize(t), t.to_string()))
            .collect();
        for test in &tests {
            test_types
                .entry(normalize(&test.test_type))
                .or_insert_with(|| test.test_type.clone());
        }

        let base = 1.0 + 9.0 * (1.0 - biomarker.testing_penetration_pct / 100.0);
        for (key, test_type) in test_types {
            let coverage = tests.iter().filter(|t| normalize(&t.test_type) == key).count();
            segments.push(WhiteSpaceSegment {
                name: format!("{} {}", biomarker.name, test_type),
                coverage,
                base,
            });
        }
    }

    segments
}

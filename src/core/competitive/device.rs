use std::collections::BTreeMap;
use crate::core::competitive::{
    self, base_entry, mapped_within, LandscapeInput, LandscapeRow, Penetration, WhiteSpaceSegment,
};
use crate::core::filters::matches_device_request;
use crate::core::resolver::{normalize, resolve, Resolution};
use crate::core::scoring::mean;
use crate::corpus::ReferenceCorpus;
use crate::models::{
    CompetitiveLandscapeResult, CompetitorEntry, DeviceCompetitor, DeviceLandscapeRequest,
    EntityKind, LandscapeKind,
};

/// Segments used when the resolved procedures list no sub-types
pub const DEFAULT_DEVICE_SEGMENTS: &[&str] = &[
    "next-generation platform",
    "ambulatory and outpatient setting",
    "pediatric patients",
    "connected and remote monitoring",
    "emerging markets",
];

impl LandscapeRow for DeviceCompetitor {
    fn entry(&self, resolution: &Resolution) -> CompetitorEntry {
        CompetitorEntry {
            category: Some(self.device_category.clone()),
            market_share_pct: self.market_share_pct,
            ..base_entry(&self.profile, mapped_within(&self.procedures, resolution))
        }
    }

    fn matrix_attributes(&self) -> Vec<(&'static str, String)> {
        let sub_types = if self.sub_types.is_empty() {
            "general use".to_string()
        } else {
            self.sub_types.join("; ")
        };
        let share = self
            .market_share_pct
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "n/a".to_string());

        vec![
            ("device_category", self.device_category.clone()),
            ("sub_types", sub_types),
            ("market_share_pct", share),
        ]
    }
}

/// Device competitive landscape for a free-text procedure
pub fn analyze(corpus: &ReferenceCorpus, request: &DeviceLandscapeRequest) -> CompetitiveLandscapeResult {
    let resolution = resolve(corpus, &request.procedure, EntityKind::Procedure);
    let mapped = corpus.devices_for(resolution.entities());

    let competitors: Vec<&DeviceCompetitor> = mapped
        .iter()
        .copied()
        .filter(|c| matches_device_request(c, request))
        .collect();
    tracing::debug!(
        "Device filters kept {} of {} competitors for '{}'",
        competitors.len(),
        mapped.len(),
        request.procedure
    );

    let procedures: Vec<_> = resolution
        .entities()
        .iter()
        .filter_map(|name| corpus.procedure(name))
        .collect();
    let penetration: Vec<f64> = procedures.iter().map(|p| p.market_penetration_pct).collect();
    let penetration = (!penetration.is_empty()).then(|| mean(&penetration));

    // Low penetration leaves more room for a new entrant
    let base = 1.0 + 9.0 * (1.0 - penetration.unwrap_or(50.0) / 100.0);
    let sub_types: Vec<&str> = procedures
        .iter()
        .flat_map(|p| p.sub_types.iter().map(String::as_str))
        .collect();
    let white_space = sub_type_segments(&sub_types, &mapped, base);

    competitive::assemble(LandscapeInput {
        kind: LandscapeKind::Device,
        query: &request.procedure,
        resolution: &resolution,
        competitors,
        white_space,
        penetration: Penetration::Market(penetration),
        entity_plural: "procedures",
    })
}

/// Sub-type segments; a device without sub-types covers every segment
fn sub_type_segments(
    sub_types: &[&str],
    mapped: &[&DeviceCompetitor],
    base: f64,
) -> Vec<WhiteSpaceSegment> {
    let catalogue: Vec<&str> = if sub_types.is_empty() {
        DEFAULT_DEVICE_SEGMENTS.to_vec()
    } else {
        sub_types.to_vec()
    };

    let mut segments: BTreeMap<String, String> = BTreeMap::new();
    for name in catalogue {
        segments.entry(normalize(name)).or_insert_with(|| name.to_string());
    }

    segments
        .into_iter()
        .map(|(key, name)| {
            let coverage = mapped
                .iter()
                .filter(|d| d.sub_types.is_empty() || d.sub_types.iter().any(|s| normalize(s) == key))
                .count();
            WhiteSpaceSegment { name, coverage, base }
        })
        .collect()
}

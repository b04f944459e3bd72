use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::core::resolver::{normalize, EntityIndex};
use crate::corpus::ReferenceCorpus;
use crate::models::{
    BiomarkerRecord, CompetitorProfile, CorpusManifest, DeviceCompetitor, DiagnosticCompetitor,
    EntityKind, IndicationRecord, PartnerRecord, PharmaCompetitor, PricingComparable,
    ProcedureRecord,
};

const MANIFEST_FILE: &str = "manifest.json";
const INDICATIONS_FILE: &str = "indications.json";
const BIOMARKERS_FILE: &str = "biomarkers.json";
const PROCEDURES_FILE: &str = "procedures.json";
const PHARMA_FILE: &str = "pharma_competitors.json";
const DEVICE_FILE: &str = "device_competitors.json";
const DIAGNOSTIC_FILE: &str = "diagnostic_competitors.json";
const PARTNERS_FILE: &str = "partners.json";
const PRICING_FILE: &str = "pricing.json";

/// Errors that can occur while loading or validating the corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse corpus file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record in {file}: {reason}")]
    Invalid { file: &'static str, reason: String },

    #[error("{record} maps to unknown {kind} '{value}'")]
    UnknownMapping {
        kind: EntityKind,
        value: String,
        record: String,
    },

    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: EntityKind, name: String },
}

/// Raw, unvalidated datasets
#[derive(Debug, Clone)]
pub struct CorpusParts {
    pub manifest: CorpusManifest,
    pub indications: Vec<IndicationRecord>,
    pub biomarkers: Vec<BiomarkerRecord>,
    pub procedures: Vec<ProcedureRecord>,
    pub pharma: Vec<PharmaCompetitor>,
    pub devices: Vec<DeviceCompetitor>,
    pub diagnostics: Vec<DiagnosticCompetitor>,
    pub partners: Vec<PartnerRecord>,
    pub pricing: Vec<PricingComparable>,
}

impl Default for CorpusParts {
    fn default() -> Self {
        Self {
            manifest: CorpusManifest {
                version: "unversioned".to_string(),
                as_of_year: 2024,
                description: None,
            },
            indications: vec![],
            biomarkers: vec![],
            procedures: vec![],
            pharma: vec![],
            devices: vec![],
            diagnostics: vec![],
            partners: vec![],
            pricing: vec![],
        }
    }
}

/// Where reference data is read from on load and reload
#[derive(Debug, Clone)]
pub enum CorpusSource {
    /// JSON files compiled into the binary from `data/`
    Embedded,
    /// Directory holding the same JSON files
    Directory(PathBuf),
    /// Pre-built parts, mainly for tests and tools
    Parts(Box<CorpusParts>),
}

impl CorpusSource {
    pub fn read(&self) -> Result<CorpusParts, CorpusError> {
        match self {
            CorpusSource::Embedded => read_embedded(),
            CorpusSource::Directory(dir) => read_directory(dir),
            CorpusSource::Parts(parts) => Ok((**parts).clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CorpusSource::Embedded => "embedded".to_string(),
            CorpusSource::Directory(dir) => dir.display().to_string(),
            CorpusSource::Parts(_) => "in-memory".to_string(),
        }
    }
}

fn parse<T: DeserializeOwned>(file: &str, contents: &str) -> Result<T, CorpusError> {
    serde_json::from_str(contents).map_err(|source| CorpusError::Parse {
        file: file.to_string(),
        source,
    })
}

fn read_embedded() -> Result<CorpusParts, CorpusError> {
    Ok(CorpusParts {
        manifest: parse(MANIFEST_FILE, include_str!("../../data/manifest.json"))?,
        indications: parse(INDICATIONS_FILE, include_str!("../../data/indications.json"))?,
        biomarkers: parse(BIOMARKERS_FILE, include_str!("../../data/biomarkers.json"))?,
        procedures: parse(PROCEDURES_FILE, include_str!("../../data/procedures.json"))?,
        pharma: parse(PHARMA_FILE, include_str!("../../data/pharma_competitors.json"))?,
        devices: parse(DEVICE_FILE, include_str!("../../data/device_competitors.json"))?,
        diagnostics: parse(
            DIAGNOSTIC_FILE,
            include_str!("../../data/diagnostic_competitors.json"),
        )?,
        partners: parse(PARTNERS_FILE, include_str!("../../data/partners.json"))?,
        pricing: parse(PRICING_FILE, include_str!("../../data/pricing.json"))?,
    })
}

fn read_file<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, CorpusError> {
    let path = dir.join(file);
    let contents = std::fs::read_to_string(&path).map_err(|source| CorpusError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(file, &contents)
}

fn read_directory(dir: &Path) -> Result<CorpusParts, CorpusError> {
    Ok(CorpusParts {
        manifest: read_file(dir, MANIFEST_FILE)?,
        indications: read_file(dir, INDICATIONS_FILE)?,
        biomarkers: read_file(dir, BIOMARKERS_FILE)?,
        procedures: read_file(dir, PROCEDURES_FILE)?,
        pharma: read_file(dir, PHARMA_FILE)?,
        devices: read_file(dir, DEVICE_FILE)?,
        diagnostics: read_file(dir, DIAGNOSTIC_FILE)?,
        partners: read_file(dir, PARTNERS_FILE)?,
        pricing: read_file(dir, PRICING_FILE)?,
    })
}

/// Validate, canonicalize and index raw parts into a snapshot
pub fn build_corpus(parts: CorpusParts, generation: u64) -> Result<ReferenceCorpus, CorpusError> {
    let CorpusParts {
        manifest,
        mut indications,
        mut biomarkers,
        mut procedures,
        mut pharma,
        mut devices,
        mut diagnostics,
        mut partners,
        mut pricing,
    } = parts;

    // Entities first: every competitor mapping is checked against them
    for record in &mut indications {
        validate_indication(record)?;
    }
    ensure_unique(EntityKind::Indication, indications.iter().map(|r| r.name.as_str()))?;
    indications.sort_by(|a, b| a.name.cmp(&b.name));
    let indication_index = EntityIndex::build(
        indications.iter().map(|r| (r.name.as_str(), r.aliases.as_slice())),
    );

    for record in &mut biomarkers {
        record.name = record.name.trim().to_string();
        if record.name.is_empty() {
            return Err(invalid(BIOMARKERS_FILE, "biomarker with empty name"));
        }
        check_pct(BIOMARKERS_FILE, &record.name, record.testing_penetration_pct)?;
        record.indications = canonicalize_lenient(&indication_index, &record.indications);
    }
    ensure_unique(EntityKind::Biomarker, biomarkers.iter().map(|r| r.name.as_str()))?;
    biomarkers.sort_by(|a, b| a.name.cmp(&b.name));
    let biomarker_index = EntityIndex::build(
        biomarkers.iter().map(|r| (r.name.as_str(), r.aliases.as_slice())),
    );

    for record in &mut procedures {
        record.name = record.name.trim().to_string();
        if record.name.is_empty() {
            return Err(invalid(PROCEDURES_FILE, "procedure with empty name"));
        }
        check_pct(PROCEDURES_FILE, &record.name, record.market_penetration_pct)?;
    }
    ensure_unique(EntityKind::Procedure, procedures.iter().map(|r| r.name.as_str()))?;
    procedures.sort_by(|a, b| a.name.cmp(&b.name));
    let procedure_index = EntityIndex::build(
        procedures.iter().map(|r| (r.name.as_str(), r.aliases.as_slice())),
    );

    for record in &mut pharma {
        validate_profile(PHARMA_FILE, &record.profile)?;
        record.indications = canonicalize_strict(
            PHARMA_FILE,
            &indication_index,
            EntityKind::Indication,
            &record.profile,
            &record.indications,
        )?;
    }

    for record in &mut devices {
        validate_profile(DEVICE_FILE, &record.profile)?;
        validate_share(DEVICE_FILE, &record.profile, record.market_share_pct)?;
        record.procedures = canonicalize_strict(
            DEVICE_FILE,
            &procedure_index,
            EntityKind::Procedure,
            &record.profile,
            &record.procedures,
        )?;
    }

    for record in &mut diagnostics {
        validate_profile(DIAGNOSTIC_FILE, &record.profile)?;
        validate_share(DIAGNOSTIC_FILE, &record.profile, record.market_share_pct)?;
        record.biomarkers = canonicalize_strict(
            DIAGNOSTIC_FILE,
            &biomarker_index,
            EntityKind::Biomarker,
            &record.profile,
            &record.biomarkers,
        )?;
        record.indications = canonicalize_lenient(&indication_index, &record.indications);
    }

    let mut seen_partners = HashSet::new();
    for record in &mut partners {
        validate_partner(record, &indication_index)?;
        if !seen_partners.insert(normalize(&record.company)) {
            return Err(invalid(PARTNERS_FILE, format!("duplicate partner '{}'", record.company)));
        }
    }
    partners.sort_by(|a, b| a.company.cmp(&b.company));

    for record in &mut pricing {
        if !(record.annual_price_usd.is_finite() && record.annual_price_usd > 0.0) {
            return Err(invalid(
                PRICING_FILE,
                format!("{} has non-positive annual price", record.product),
            ));
        }
        record.indication = canonicalize_lenient(
            &indication_index,
            std::slice::from_ref(&record.indication),
        )
        .into_iter()
        .next()
        .unwrap_or_default();
    }

    let indication_positions = positions(indications.iter().map(|r| r.name.as_str()));
    let biomarker_positions = positions(biomarkers.iter().map(|r| r.name.as_str()));
    let procedure_positions = positions(procedures.iter().map(|r| r.name.as_str()));
    let pharma_by_indication = mapping(pharma.iter().map(|r| r.indications.as_slice()));
    let devices_by_procedure = mapping(devices.iter().map(|r| r.procedures.as_slice()));
    let diagnostics_by_biomarker = mapping(diagnostics.iter().map(|r| r.biomarkers.as_slice()));

    tracing::info!(
        "Built corpus {} (generation {}): {} indications, {} biomarkers, {} procedures, {} pharma / {} device / {} diagnostic competitors, {} partners, {} pricing comparables",
        manifest.version,
        generation,
        indications.len(),
        biomarkers.len(),
        procedures.len(),
        pharma.len(),
        devices.len(),
        diagnostics.len(),
        partners.len(),
        pricing.len(),
    );

    Ok(ReferenceCorpus {
        manifest,
        generation,
        loaded_at: chrono::Utc::now(),
        indications,
        biomarkers,
        procedures,
        pharma,
        devices,
        diagnostics,
        partners,
        pricing,
        indication_index,
        biomarker_index,
        procedure_index,
        indication_positions,
        biomarker_positions,
        procedure_positions,
        pharma_by_indication,
        devices_by_procedure,
        diagnostics_by_biomarker,
    })
}

fn invalid(file: &'static str, reason: impl Into<String>) -> CorpusError {
    CorpusError::Invalid {
        file,
        reason: reason.into(),
    }
}

fn check_pct(file: &'static str, record: &str, value: f64) -> Result<(), CorpusError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(invalid(file, format!("{} has percentage {} outside [0, 100]", record, value)));
    }
    Ok(())
}

fn validate_indication(record: &mut IndicationRecord) -> Result<(), CorpusError> {
    record.name = record.name.trim().to_string();
    if record.name.is_empty() {
        return Err(invalid(INDICATIONS_FILE, "indication with empty name"));
    }
    record.therapy_area = normalize(&record.therapy_area);
    if record.therapy_area.is_empty() {
        return Err(invalid(INDICATIONS_FILE, format!("{} has no therapy area", record.name)));
    }
    if !(1.0..=10.0).contains(&record.unmet_need) {
        return Err(invalid(
            INDICATIONS_FILE,
            format!("{} has unmet need {} outside [1, 10]", record.name, record.unmet_need),
        ));
    }
    if !record.cagr_5yr.is_finite() {
        return Err(invalid(INDICATIONS_FILE, format!("{} has non-finite CAGR", record.name)));
    }
    let mut figures = record.prevalence.values().chain(record.incidence.values());
    if figures.any(|v| !v.is_finite() || *v < 0.0) {
        return Err(invalid(
            INDICATIONS_FILE,
            format!("{} has negative or non-finite patient counts", record.name),
        ));
    }
    check_pct(INDICATIONS_FILE, &record.name, record.treated_pct)
}

fn validate_profile(file: &'static str, profile: &CompetitorProfile) -> Result<(), CorpusError> {
    if profile.company.trim().is_empty() || profile.product.trim().is_empty() {
        return Err(invalid(file, "competitor with empty company or product"));
    }
    for (field, value) in [
        ("differentiation_score", profile.differentiation_score),
        ("evidence_strength", profile.evidence_strength),
    ] {
        if !(1.0..=10.0).contains(&value) {
            return Err(invalid(
                file,
                format!("{} has {} {} outside [1, 10]", profile.label(), field, value),
            ));
        }
    }
    Ok(())
}

fn validate_share(
    file: &'static str,
    profile: &CompetitorProfile,
    share: Option<f64>,
) -> Result<(), CorpusError> {
    match share {
        Some(value) => check_pct(file, &profile.label(), value),
        None => Ok(()),
    }
}

fn validate_partner(record: &mut PartnerRecord, indications: &EntityIndex) -> Result<(), CorpusError> {
    record.company = record.company.trim().to_string();
    if record.company.is_empty() {
        return Err(invalid(PARTNERS_FILE, "partner with empty company"));
    }
    if record.therapeutic_focus.values().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(invalid(
            PARTNERS_FILE,
            format!("{} has a negative therapeutic focus weight", record.company),
        ));
    }

    record.therapeutic_focus = record
        .therapeutic_focus
        .iter()
        .fold(BTreeMap::new(), |mut acc, (area, weight)| {
            *acc.entry(normalize(area)).or_insert(0.0) += weight;
            acc
        });

    record.pipeline = record
        .pipeline
        .iter()
        .fold(BTreeMap::new(), |mut acc, (indication, count)| {
            let key = indications
                .exact(indication)
                .into_iter()
                .next()
                .unwrap_or_else(|| indication.clone());
            *acc.entry(key).or_insert(0) += count;
            acc
        });

    Ok(())
}

fn ensure_unique<'a>(
    kind: EntityKind,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), CorpusError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(normalize(name)) {
            return Err(CorpusError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Map every value to its canonical entity; unknown values are an error
fn canonicalize_strict(
    file: &'static str,
    index: &EntityIndex,
    kind: EntityKind,
    profile: &CompetitorProfile,
    values: &[String],
) -> Result<Vec<String>, CorpusError> {
    if values.is_empty() {
        return Err(invalid(file, format!("{} has no {} mapping", profile.label(), kind)));
    }

    let mut canonical = Vec::with_capacity(values.len());
    for value in values {
        let hits = index.exact(value);
        if hits.is_empty() {
            return Err(CorpusError::UnknownMapping {
                kind,
                value: value.clone(),
                record: profile.label(),
            });
        }
        canonical.extend(hits);
    }
    canonical.sort();
    canonical.dedup();
    Ok(canonical)
}

/// Map values to canonical entities where possible, keeping the rest as given
fn canonicalize_lenient(index: &EntityIndex, values: &[String]) -> Vec<String> {
    let mut canonical: Vec<String> = values
        .iter()
        .flat_map(|value| {
            let hits = index.exact(value);
            if hits.is_empty() { vec![value.trim().to_string()] } else { hits }
        })
        .collect();
    canonical.sort();
    canonical.dedup();
    canonical
}

fn positions<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    names
        .enumerate()
        .map(|(i, name)| (name.to_string(), i))
        .collect()
}

fn mapping<'a>(keys: impl Iterator<Item = &'a [String]>) -> HashMap<String, Vec<usize>> {
    let mut map: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, entities) in keys.enumerate() {
        for entity in entities {
            map.entry(entity.clone()).or_default().push(position);
        }
    }
    map
}

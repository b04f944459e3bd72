//! Immutable reference corpus and its publication.
//!
//! A `ReferenceCorpus` is a validated, indexed snapshot of every reference
//! dataset. Snapshots are never mutated; `CorpusStore` swaps whole snapshots.

pub mod loader;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::core::resolver::EntityIndex;
use crate::models::{
    BiomarkerRecord, CorpusManifest, DeviceCompetitor, DiagnosticCompetitor, EntityKind,
    IndicationRecord, PartnerRecord, PharmaCompetitor, PricingComparable, ProcedureRecord,
};

pub use loader::{CorpusError, CorpusParts, CorpusSource};
pub use store::CorpusStore;

/// Summary of a published snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusInfo {
    pub version: String,
    pub as_of_year: i32,
    pub generation: u64,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
    pub indications: usize,
    pub biomarkers: usize,
    pub procedures: usize,
    pub pharma_competitors: usize,
    pub device_competitors: usize,
    pub diagnostic_competitors: usize,
    pub partners: usize,
    pub pricing_comparables: usize,
}

/// Validated, indexed reference data. Built by `loader::build_corpus`.
#[derive(Debug)]
pub struct ReferenceCorpus {
    pub(crate) manifest: CorpusManifest,
    pub(crate) generation: u64,
    pub(crate) loaded_at: chrono::DateTime<chrono::Utc>,
    pub(crate) indications: Vec<IndicationRecord>,
    pub(crate) biomarkers: Vec<BiomarkerRecord>,
    pub(crate) procedures: Vec<ProcedureRecord>,
    pub(crate) pharma: Vec<PharmaCompetitor>,
    pub(crate) devices: Vec<DeviceCompetitor>,
    pub(crate) diagnostics: Vec<DiagnosticCompetitor>,
    pub(crate) partners: Vec<PartnerRecord>,
    pub(crate) pricing: Vec<PricingComparable>,
    pub(crate) indication_index: EntityIndex,
    pub(crate) biomarker_index: EntityIndex,
    pub(crate) procedure_index: EntityIndex,
    pub(crate) indication_positions: HashMap<String, usize>,
    pub(crate) biomarker_positions: HashMap<String, usize>,
    pub(crate) procedure_positions: HashMap<String, usize>,
    pub(crate) pharma_by_indication: HashMap<String, Vec<usize>>,
    pub(crate) devices_by_procedure: HashMap<String, Vec<usize>>,
    pub(crate) diagnostics_by_biomarker: HashMap<String, Vec<usize>>,
}

impl ReferenceCorpus {
    /// Build a snapshot from in-memory parts (generation 0)
    pub fn from_parts(parts: CorpusParts) -> Result<Self, CorpusError> {
        loader::build_corpus(parts, 0)
    }

    /// The corpus shipped inside the binary
    pub fn embedded() -> Result<Self, CorpusError> {
        Self::from_parts(CorpusSource::Embedded.read()?)
    }

    pub fn manifest(&self) -> &CorpusManifest {
        &self.manifest
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn indications(&self) -> &[IndicationRecord] {
        &self.indications
    }

    pub fn biomarkers(&self) -> &[BiomarkerRecord] {
        &self.biomarkers
    }

    pub fn procedures(&self) -> &[ProcedureRecord] {
        &self.procedures
    }

    pub fn pharma_competitors(&self) -> &[PharmaCompetitor] {
        &self.pharma
    }

    pub fn device_competitors(&self) -> &[DeviceCompetitor] {
        &self.devices
    }

    pub fn diagnostic_competitors(&self) -> &[DiagnosticCompetitor] {
        &self.diagnostics
    }

    pub fn partners(&self) -> &[PartnerRecord] {
        &self.partners
    }

    pub fn pricing_comparables(&self) -> &[PricingComparable] {
        &self.pricing
    }

    pub fn entity_index(&self, kind: EntityKind) -> &EntityIndex {
        match kind {
            EntityKind::Indication => &self.indication_index,
            EntityKind::Biomarker => &self.biomarker_index,
            EntityKind::Procedure => &self.procedure_index,
        }
    }

    pub fn indication(&self, canonical: &str) -> Option<&IndicationRecord> {
        self.indication_positions
            .get(canonical)
            .map(|i| &self.indications[*i])
    }

    pub fn biomarker(&self, canonical: &str) -> Option<&BiomarkerRecord> {
        self.biomarker_positions
            .get(canonical)
            .map(|i| &self.biomarkers[*i])
    }

    pub fn procedure(&self, canonical: &str) -> Option<&ProcedureRecord> {
        self.procedure_positions
            .get(canonical)
            .map(|i| &self.procedures[*i])
    }

    /// Pharma competitors mapped to any of the given indications, deduplicated
    pub fn pharma_for<'a>(&'a self, indications: &[String]) -> Vec<&'a PharmaCompetitor> {
        collect_mapped(&self.pharma_by_indication, indications)
            .into_iter()
            .map(|i| &self.pharma[i])
            .collect()
    }

    pub fn devices_for<'a>(&'a self, procedures: &[String]) -> Vec<&'a DeviceCompetitor> {
        collect_mapped(&self.devices_by_procedure, procedures)
            .into_iter()
            .map(|i| &self.devices[i])
            .collect()
    }

    pub fn diagnostics_for<'a>(&'a self, biomarkers: &[String]) -> Vec<&'a DiagnosticCompetitor> {
        collect_mapped(&self.diagnostics_by_biomarker, biomarkers)
            .into_iter()
            .map(|i| &self.diagnostics[i])
            .collect()
    }

    pub fn info(&self) -> CorpusInfo {
        CorpusInfo {
            version: self.manifest.version.clone(),
            as_of_year: self.manifest.as_of_year,
            generation: self.generation,
            loaded_at: self.loaded_at,
            indications: self.indications.len(),
            biomarkers: self.biomarkers.len(),
            procedures: self.procedures.len(),
            pharma_competitors: self.pharma.len(),
            device_competitors: self.devices.len(),
            diagnostic_competitors: self.diagnostics.len(),
            partners: self.partners.len(),
            pricing_comparables: self.pricing.len(),
        }
    }
}

/// Union of record positions across keys, in corpus order
fn collect_mapped(map: &HashMap<String, Vec<usize>>, keys: &[String]) -> Vec<usize> {
    let mut positions: Vec<usize> = keys
        .iter()
        .filter_map(|k| map.get(k))
        .flatten()
        .copied()
        .collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

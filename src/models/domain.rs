use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Geography key used for worldwide figures
pub const GLOBAL_GEOGRAPHY: &str = "Global";

/// Development stage of a pipeline asset or of a deal's lead asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevelopmentStage {
    Preclinical,
    Phase1,
    Phase2,
    Phase3,
    Filed,
    Approved,
}

impl DevelopmentStage {
    pub const ALL: [DevelopmentStage; 6] = [
        DevelopmentStage::Preclinical,
        DevelopmentStage::Phase1,
        DevelopmentStage::Phase2,
        DevelopmentStage::Phase3,
        DevelopmentStage::Filed,
        DevelopmentStage::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevelopmentStage::Preclinical => "preclinical",
            DevelopmentStage::Phase1 => "phase1",
            DevelopmentStage::Phase2 => "phase2",
            DevelopmentStage::Phase3 => "phase3",
            DevelopmentStage::Filed => "filed",
            DevelopmentStage::Approved => "approved",
        }
    }
}

impl fmt::Display for DevelopmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regulatory status of a marketed or investigational competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulatoryStatus {
    Approved,
    Pipeline,
}

impl RegulatoryStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, RegulatoryStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegulatoryStatus::Approved => "approved",
            RegulatoryStatus::Pipeline => "pipeline",
        }
    }
}

/// Product categories an indication can be addressed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Therapeutic,
    Device,
    Diagnostic,
}

/// Kinds of free-text entity the resolver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Indication,
    Biomarker,
    Procedure,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Indication => "indication",
            EntityKind::Biomarker => "biomarker",
            EntityKind::Procedure => "procedure",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count of known pipeline assets per development stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDistribution {
    #[serde(default)]
    pub preclinical: u32,
    #[serde(default)]
    pub phase1: u32,
    #[serde(default)]
    pub phase2: u32,
    #[serde(default)]
    pub phase3: u32,
    #[serde(default)]
    pub filed: u32,
    #[serde(default)]
    pub approved: u32,
}

impl PhaseDistribution {
    pub fn count(&self, stage: DevelopmentStage) -> u32 {
        match stage {
            DevelopmentStage::Preclinical => self.preclinical,
            DevelopmentStage::Phase1 => self.phase1,
            DevelopmentStage::Phase2 => self.phase2,
            DevelopmentStage::Phase3 => self.phase3,
            DevelopmentStage::Filed => self.filed,
            DevelopmentStage::Approved => self.approved,
        }
    }

    pub fn total(&self) -> u32 {
        DevelopmentStage::ALL.iter().map(|s| self.count(*s)).sum()
    }
}

/// Canonical indication with epidemiology and market figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicationRecord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub therapy_area: String,
    /// Prevalent patients keyed by geography
    pub prevalence: BTreeMap<String, f64>,
    /// New patients per year keyed by geography
    #[serde(default)]
    pub incidence: BTreeMap<String, f64>,
    /// Five-year market CAGR in percent
    pub cagr_5yr: f64,
    /// 1 (well served) to 10 (no adequate therapy)
    pub unmet_need: f64,
    #[serde(default)]
    pub phase_distribution: PhaseDistribution,
    /// Share of prevalent patients currently receiving treatment, in percent
    #[serde(default)]
    pub treated_pct: f64,
    #[serde(default = "default_product_categories")]
    pub product_categories: Vec<ProductCategory>,
}

fn default_product_categories() -> Vec<ProductCategory> {
    vec![ProductCategory::Therapeutic]
}

impl IndicationRecord {
    /// Worldwide prevalence, summing regions when no global figure exists
    pub fn global_prevalence(&self) -> f64 {
        geography_total(&self.prevalence)
    }

    pub fn global_incidence(&self) -> f64 {
        geography_total(&self.incidence)
    }

    pub fn prevalence_in(&self, geography: &str) -> f64 {
        geography_value(&self.prevalence, geography)
    }

    pub fn incidence_in(&self, geography: &str) -> f64 {
        geography_value(&self.incidence, geography)
    }
}

fn geography_total(values: &BTreeMap<String, f64>) -> f64 {
    match values.get(GLOBAL_GEOGRAPHY) {
        Some(global) => *global,
        None => values.values().sum(),
    }
}

fn geography_value(values: &BTreeMap<String, f64>, geography: &str) -> f64 {
    if geography.eq_ignore_ascii_case(GLOBAL_GEOGRAPHY) {
        return geography_total(values);
    }
    values
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(geography))
        .map(|(_, value)| *value)
        .unwrap_or(0.0)
}

/// Fields shared by every competitor variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub company: String,
    pub product: String,
    pub status: RegulatoryStatus,
    /// Mechanism for drugs, technology for devices, assay platform for tests
    pub platform: String,
    pub differentiation_score: f64,
    pub evidence_strength: f64,
}

impl CompetitorProfile {
    /// "Product (Company)" label used as matrix column key
    pub fn label(&self) -> String {
        format!("{} ({})", self.product, self.company)
    }
}

/// Drug or biologic competing in one or more indications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmaCompetitor {
    #[serde(flatten)]
    pub profile: CompetitorProfile,
    pub indications: Vec<String>,
    pub stage: DevelopmentStage,
    pub modality: String,
}

/// Medical device competing in one or more procedures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCompetitor {
    #[serde(flatten)]
    pub profile: CompetitorProfile,
    pub procedures: Vec<String>,
    pub device_category: String,
    /// Procedure sub-types the device is labelled for; empty means general use
    #[serde(default)]
    pub sub_types: Vec<String>,
    #[serde(default)]
    pub market_share_pct: Option<f64>,
}

/// Diagnostic or companion diagnostic test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticCompetitor {
    #[serde(flatten)]
    pub profile: CompetitorProfile,
    pub biomarkers: Vec<String>,
    pub test_type: String,
    #[serde(default)]
    pub linked_drugs: Vec<String>,
    #[serde(default)]
    pub indications: Vec<String>,
    #[serde(default)]
    pub market_share_pct: Option<f64>,
}

/// Access to the shared profile regardless of variant
pub trait Competitor {
    fn profile(&self) -> &CompetitorProfile;

    /// Weight of this competitor in the stage-weighted crowding count
    fn stage_weight(&self) -> f64;

    fn market_share_pct(&self) -> Option<f64> {
        None
    }
}

impl Competitor for PharmaCompetitor {
    fn profile(&self) -> &CompetitorProfile {
        &self.profile
    }

    fn stage_weight(&self) -> f64 {
        if self.profile.status.is_approved() {
            return 1.0;
        }
        match self.stage {
            DevelopmentStage::Approved => 1.0,
            DevelopmentStage::Filed => 0.8,
            DevelopmentStage::Phase3 => 0.6,
            DevelopmentStage::Phase2 => 0.4,
            DevelopmentStage::Phase1 => 0.25,
            DevelopmentStage::Preclinical => 0.1,
        }
    }
}

impl Competitor for DeviceCompetitor {
    fn profile(&self) -> &CompetitorProfile {
        &self.profile
    }

    fn stage_weight(&self) -> f64 {
        if self.profile.status.is_approved() { 1.0 } else { 0.5 }
    }

    fn market_share_pct(&self) -> Option<f64> {
        self.market_share_pct
    }
}

impl Competitor for DiagnosticCompetitor {
    fn profile(&self) -> &CompetitorProfile {
        &self.profile
    }

    fn stage_weight(&self) -> f64 {
        if self.profile.status.is_approved() { 1.0 } else { 0.5 }
    }

    fn market_share_pct(&self) -> Option<f64> {
        self.market_share_pct
    }
}

/// Biomarker entity used for diagnostic landscapes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomarkerRecord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub indications: Vec<String>,
    /// Share of eligible patients tested today, in percent
    #[serde(default)]
    pub testing_penetration_pct: f64,
}

/// Procedure entity used for device landscapes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub sub_types: Vec<String>,
    /// Share of eligible patients receiving the procedure, in percent
    #[serde(default)]
    pub market_penetration_pct: f64,
}

/// Deal structures a partner can be matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    Licensing,
    CoDevelopment,
    Acquisition,
    Option,
    CoPromotion,
    ResearchCollaboration,
}

/// One historical transaction of a partner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealRecord {
    pub year: i32,
    pub deal_type: DealType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialTier {
    Mega,
    Large,
    Mid,
    Small,
}

/// Candidate partner company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub company: String,
    #[serde(default)]
    pub deal_history: Vec<DealRecord>,
    /// Relative focus per therapy area; non-negative, not required to sum to 1
    #[serde(default)]
    pub therapeutic_focus: BTreeMap<String, f64>,
    pub financial_tier: FinancialTier,
    #[serde(default)]
    pub strategic_priorities: Vec<String>,
    #[serde(default)]
    pub geographies: Vec<String>,
    /// In-house pipeline asset counts keyed by indication
    #[serde(default)]
    pub pipeline: BTreeMap<String, u32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool { true }

/// Launched product price used to benchmark market size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingComparable {
    pub product: String,
    pub company: String,
    pub indication: String,
    pub annual_price_usd: f64,
    pub launch_year: i32,
}

/// Version stamp of a corpus release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusManifest {
    pub version: String,
    /// Reference year for recency-weighted scoring
    pub as_of_year: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indication(prevalence: &[(&str, f64)]) -> IndicationRecord {
        IndicationRecord {
            name: "Test".to_string(),
            aliases: vec![],
            therapy_area: "oncology".to_string(),
            prevalence: prevalence.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            incidence: BTreeMap::new(),
            cagr_5yr: 5.0,
            unmet_need: 5.0,
            phase_distribution: PhaseDistribution::default(),
            treated_pct: 50.0,
            product_categories: default_product_categories(),
        }
    }

    #[test]
    fn test_global_prevalence_prefers_global_key() {
        let record = indication(&[("Global", 1000.0), ("US", 300.0)]);
        assert_eq!(record.global_prevalence(), 1000.0);
    }

    #[test]
    fn test_global_prevalence_sums_regions() {
        let record = indication(&[("US", 300.0), ("EU5", 200.0)]);
        assert_eq!(record.global_prevalence(), 500.0);
        assert_eq!(record.prevalence_in("us"), 300.0);
        assert_eq!(record.prevalence_in("Japan"), 0.0);
    }

    #[test]
    fn test_stage_weights() {
        let pipeline = PharmaCompetitor {
            profile: CompetitorProfile {
                company: "Acme".to_string(),
                product: "AC-1".to_string(),
                status: RegulatoryStatus::Pipeline,
                platform: "PD-1 inhibitor".to_string(),
                differentiation_score: 5.0,
                evidence_strength: 5.0,
            },
            indications: vec!["Melanoma".to_string()],
            stage: DevelopmentStage::Phase2,
            modality: "monoclonal antibody".to_string(),
        };
        assert_eq!(pipeline.stage_weight(), 0.4);

        let mut approved = pipeline.clone();
        approved.profile.status = RegulatoryStatus::Approved;
        assert_eq!(approved.stage_weight(), 1.0);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(DevelopmentStage::Phase3 > DevelopmentStage::Phase2);
        assert_eq!(PhaseDistribution { phase1: 2, phase3: 1, ..Default::default() }.total(), 3);
    }
}

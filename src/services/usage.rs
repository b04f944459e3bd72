use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Billable analysis features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageFeature {
    PharmaLandscape,
    DeviceLandscape,
    DiagnosticLandscape,
    PartnerMatch,
    OpportunityScreen,
    MarketSizing,
}

impl UsageFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageFeature::PharmaLandscape => "pharma_landscape",
            UsageFeature::DeviceLandscape => "device_landscape",
            UsageFeature::DiagnosticLandscape => "diagnostic_landscape",
            UsageFeature::PartnerMatch => "partner_match",
            UsageFeature::OpportunityScreen => "opportunity_screen",
            UsageFeature::MarketSizing => "market_sizing",
        }
    }
}

impl fmt::Display for UsageFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful, metered analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub event_id: String,
    pub user_id: Option<String>,
    pub feature: UsageFeature,
    /// Subject of the call (indication, procedure or biomarker), if any
    pub indication: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl UsageEvent {
    pub fn new(feature: UsageFeature, user_id: Option<String>, indication: Option<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            feature,
            indication,
            metadata: BTreeMap::new(),
            recorded_at: chrono::Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Sink for usage events. Recording is best-effort and never fails a request.
pub trait UsageRecorder: Send + Sync {
    fn record(&self, event: UsageEvent);
}

/// Writes each event as a structured `tracing` record
#[derive(Debug, Clone, Default)]
pub struct TracingUsageRecorder;

impl UsageRecorder for TracingUsageRecorder {
    fn record(&self, event: UsageEvent) {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        tracing::info!(
            target: "dealscope::usage",
            event_id = %event.event_id,
            user_id = event.user_id.as_deref().unwrap_or("anonymous"),
            feature = %event.feature,
            indication = event.indication.as_deref().unwrap_or(""),
            metadata = %metadata,
            recorded_at = %event.recorded_at,
            "usage recorded"
        );
    }
}

/// Keeps events in memory, for tests and local inspection
#[derive(Debug, Default)]
pub struct InMemoryUsageRecorder {
    events: Mutex<Vec<UsageEvent>>,
}

impl InMemoryUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, feature: UsageFeature) -> usize {
        self.events.lock().iter().filter(|e| e.feature == feature).count()
    }
}

impl UsageRecorder for InMemoryUsageRecorder {
    fn record(&self, event: UsageEvent) {
        self.events.lock().push(event);
    }
}

//! Versioned weight tables for the composite scores.
//!
//! Bump the matching version constant whenever a default changes so that
//! stored results can be traced back to the table that produced them.

use serde::{Deserialize, Serialize};

pub const PARTNER_WEIGHTS_VERSION: &str = "partner-v3";
pub const OPPORTUNITY_WEIGHTS_VERSION: &str = "opportunity-v2";

/// Stage-weighted count at which crowding reaches ~63% of its range
pub const CROWDING_SATURATION_COUNT: f64 = 6.0;
/// Maximum crowding points added when differentiation scores cluster tightly
pub const CROWDING_CLUSTER_BONUS: f64 = 1.5;
/// Differentiation range (one point either side) that counts as one cluster
pub const CROWDING_CLUSTER_WIDTH: f64 = 2.0;

/// Weights of the six partner sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartnerWeights {
    pub therapeutic_alignment: f64,
    pub pipeline_gap: f64,
    pub deal_history: f64,
    pub financial_capacity: f64,
    pub geography_fit: f64,
    pub strategic_priority: f64,
}

impl Default for PartnerWeights {
    fn default() -> Self {
        Self {
            therapeutic_alignment: 0.25,
            pipeline_gap: 0.15,
            deal_history: 0.20,
            financial_capacity: 0.15,
            geography_fit: 0.10,
            strategic_priority: 0.15,
        }
    }
}

impl PartnerWeights {
    /// Same order as `ScoreBreakdown::as_array`
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.therapeutic_alignment,
            self.pipeline_gap,
            self.deal_history,
            self.financial_capacity,
            self.geography_fit,
            self.strategic_priority,
        ]
    }

    pub fn is_normalised(&self) -> bool {
        let values = self.as_array();
        values.iter().all(|w| *w >= 0.0) && (values.iter().sum::<f64>() - 1.0).abs() < 1e-6
    }

    /// Rescale so the weights sum to 1; negative weights are zeroed first
    pub fn normalise(&mut self) {
        for weight in [
            &mut self.therapeutic_alignment,
            &mut self.pipeline_gap,
            &mut self.deal_history,
            &mut self.financial_capacity,
            &mut self.geography_fit,
            &mut self.strategic_priority,
        ] {
            *weight = weight.max(0.0);
        }
        let sum: f64 = self.as_array().iter().sum();
        if sum <= 0.0 {
            *self = Self::default();
            return;
        }
        self.therapeutic_alignment /= sum;
        self.pipeline_gap /= sum;
        self.deal_history /= sum;
        self.financial_capacity /= sum;
        self.geography_fit /= sum;
        self.strategic_priority /= sum;
    }
}

/// Weights of the opportunity score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpportunityWeights {
    pub market_size: f64,
    pub growth: f64,
    pub unmet_need: f64,
    pub inverse_crowding: f64,
}

impl Default for OpportunityWeights {
    fn default() -> Self {
        Self {
            market_size: 0.30,
            growth: 0.20,
            unmet_need: 0.25,
            inverse_crowding: 0.25,
        }
    }
}

impl OpportunityWeights {
    pub fn as_array(&self) -> [f64; 4] {
        [self.market_size, self.growth, self.unmet_need, self.inverse_crowding]
    }

    pub fn is_normalised(&self) -> bool {
        let values = self.as_array();
        values.iter().all(|w| *w >= 0.0) && (values.iter().sum::<f64>() - 1.0).abs() < 1e-6
    }

    pub fn normalise(&mut self) {
        self.market_size = self.market_size.max(0.0);
        self.growth = self.growth.max(0.0);
        self.unmet_need = self.unmet_need.max(0.0);
        self.inverse_crowding = self.inverse_crowding.max(0.0);
        let sum: f64 = self.as_array().iter().sum();
        if sum <= 0.0 {
            *self = Self::default();
            return;
        }
        self.market_size /= sum;
        self.growth /= sum;
        self.unmet_need /= sum;
        self.inverse_crowding /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_defaults_are_documented_constants() {
        let w = PartnerWeights::default();
        assert_eq!(w.as_array(), [0.25, 0.15, 0.20, 0.15, 0.10, 0.15]);
        assert!(w.is_normalised());
        assert_eq!(PARTNER_WEIGHTS_VERSION, "partner-v3");
    }

    #[test]
    fn test_opportunity_defaults_are_documented_constants() {
        let w = OpportunityWeights::default();
        assert_eq!(w.as_array(), [0.30, 0.20, 0.25, 0.25]);
        assert!(w.is_normalised());
        assert_eq!(OPPORTUNITY_WEIGHTS_VERSION, "opportunity-v2");
    }

    #[test]
    fn test_normalise_restores_sum() {
        let mut w = PartnerWeights::default();
        w.deal_history += 0.5;
        assert!(!w.is_normalised());
        w.normalise();
        assert!(w.is_normalised());
    }

    #[test]
    fn test_normalise_all_zero_falls_back_to_defaults() {
        let mut w = OpportunityWeights {
            market_size: 0.0,
            growth: 0.0,
            unmet_need: -1.0,
            inverse_crowding: 0.0,
        };
        w.normalise();
        assert_eq!(w, OpportunityWeights::default());
    }
}

// Core algorithm exports
pub mod competitive;
pub mod engine;
pub mod filters;
pub mod market;
pub mod matcher;
pub mod narrative;
pub mod resolver;
pub mod scoring;
pub mod screener;
pub mod weights;

pub use engine::{Analysis, Engine, EngineError, EngineOptions};
pub use matcher::PartnerMatcher;
pub use resolver::{resolve, Resolution};
pub use weights::{OpportunityWeights, PartnerWeights, OPPORTUNITY_WEIGHTS_VERSION, PARTNER_WEIGHTS_VERSION};

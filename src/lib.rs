//! dealscope - opportunity and competitive intelligence scoring for life sciences
//!
//! Scores therapeutic indications, competitive landscapes (pharma, device,
//! diagnostic), licensing partners and market size against an immutable
//! reference corpus that can be reloaded without restarting the service.

pub mod config;
pub mod core;
pub mod corpus;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Analysis, Engine, EngineError, EngineOptions, PartnerMatcher, Resolution};
pub use crate::corpus::{CorpusError, CorpusSource, CorpusStore, ReferenceCorpus};

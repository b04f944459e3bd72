// Service exports
pub mod usage;

pub use usage::{InMemoryUsageRecorder, TracingUsageRecorder, UsageEvent, UsageFeature, UsageRecorder};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use crate::core::{EngineOptions, OpportunityWeights, PartnerWeights};
use crate::core::engine::DEFAULT_MAX_SCREENER_LIMIT;
use crate::corpus::CorpusSource;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub corpus: CorpusSettings,
    #[serde(default)]
    pub screener: ScreenerSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorpusSettings {
    /// Directory with the corpus JSON files; the embedded corpus when unset
    pub data_dir: Option<String>,
    /// Reload the corpus on this interval; disabled when unset or zero
    pub refresh_interval_secs: Option<u64>,
}

impl CorpusSettings {
    pub fn source(&self) -> CorpusSource {
        match self.data_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => CorpusSource::Directory(PathBuf::from(dir)),
            _ => CorpusSource::Embedded,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreenerSettings {
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
        }
    }
}

fn default_max_limit() -> usize { DEFAULT_MAX_SCREENER_LIMIT }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub partner_weights: PartnerWeights,
    #[serde(default)]
    pub opportunity_weights: OpportunityWeights,
}

impl ScoringSettings {
    /// Partner weights, rescaled to sum to 1 if the configured ones do not
    pub fn partner_weights(&self) -> PartnerWeights {
        let mut weights = self.partner_weights;
        if !weights.is_normalised() {
            tracing::warn!("Configured partner weights {:?} do not sum to 1, rescaling", weights);
            weights.normalise();
        }
        weights
    }

    pub fn opportunity_weights(&self) -> OpportunityWeights {
        let mut weights = self.opportunity_weights;
        if !weights.is_normalised() {
            tracing::warn!("Configured opportunity weights {:?} do not sum to 1, rescaling", weights);
            weights.normalise();
        }
        weights
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DEALSCOPE_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DEALSCOPE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("DEALSCOPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_overrides(settings)?;
        settings.try_deserialize()
    }

    /// Parse a TOML document without touching files or the environment
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            partner_weights: self.scoring.partner_weights(),
            opportunity_weights: self.scoring.opportunity_weights(),
            max_screener_limit: self.screener.max_limit.max(1),
        }
    }
}

/// Short-form environment overrides kept for deployment scripts:
/// `CORPUS_DIR` and `PORT`
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(dir) = env::var("CORPUS_DIR") {
        builder = builder.set_override("corpus.data_dir", dir)?;
    }
    if let Ok(port) = env::var("PORT") {
        builder = builder.set_override("server.port", port)?;
    }

    builder.build()
}

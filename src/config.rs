//! Run configuration loaded once from YAML.
//!
//! The file is read a single time at process start into an immutable
//! [`DigestConfig`] and handed to every component by reference. Missing
//! optional sections fall back to the defaults below; the required ones
//! (`verification`, `time_settings`, `article_limits`) must be present.
//!
//! ```yaml
//! verification:
//!   trusted_domains: [reuters.com, theverge.com, arxiv.org]
//!   min_sources: 2
//! time_settings:
//!   lookback_hours: 24
//! article_limits:
//!   max_articles_per_day: 10
//! api:
//!   serper:
//!     endpoint: https://google.serper.dev/search
//! ```

use crate::error::{DigestError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
pub const DEFAULT_QUERY: &str = "artificial intelligence news";

#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    pub verification: VerificationConfig,
    pub time_settings: TimeSettings,
    pub article_limits: ArticleLimits,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Domain suffixes accepted as news and corroboration sources.
    pub trusted_domains: Vec<String>,
    /// Trusted hits a claim needs before it counts as corroborated.
    pub min_sources: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSettings {
    pub lookback_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleLimits {
    pub max_articles_per_day: usize,
    #[serde(default)]
    pub fetch_full_content: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub serper: SerperConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerperConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_query")]
    pub query: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            query: default_query(),
        }
    }
}

/// Settings for the external text-generation capability.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_summarizer_template")]
    pub summarizer_template: String,
    #[serde(default = "default_verifier_template")]
    pub verifier_template: String,
    #[serde(default = "default_true")]
    pub use_judge: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
    /// Upper bound on a single model call. Expiry counts as a transport failure.
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    /// Items processed at once within a stage. Output order never changes.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            summarizer_template: default_summarizer_template(),
            verifier_template: default_verifier_template(),
            use_judge: true,
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            timeout_secs: default_generation_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_SERPER_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

fn default_summarizer_template() -> String {
    "digest_summarizer".to_string()
}

fn default_verifier_template() -> String {
    "digest_verifier".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> usize {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    250
}

fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_concurrency() -> usize {
    1
}

impl DigestConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: DigestConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            DigestError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml(&text)?;
        info!(
            trusted_domains = config.verification.trusted_domains.len(),
            min_sources = config.verification.min_sources,
            lookback_hours = config.time_settings.lookback_hours,
            max_articles = config.article_limits.max_articles_per_day,
            "Loaded digest configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(DigestError::Configuration(msg.to_string()));

        if self
            .verification
            .trusted_domains
            .iter()
            .all(|d| d.trim().is_empty())
        {
            return invalid("verification.trusted_domains must list at least one domain");
        }
        if self.verification.min_sources == 0 {
            return invalid("verification.min_sources must be at least 1");
        }
        if self.time_settings.lookback_hours < 1 {
            return invalid("time_settings.lookback_hours must be at least 1");
        }
        if self.article_limits.max_articles_per_day == 0 {
            return invalid("article_limits.max_articles_per_day must be at least 1");
        }
        if self.generation.concurrency == 0 {
            return invalid("generation.concurrency must be at least 1");
        }
        if self.generation.timeout_secs == 0 {
            return invalid("generation.timeout_secs must be at least 1");
        }
        match Url::parse(&self.api.serper.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            Ok(url) => Err(DigestError::Configuration(format!(
                "api.serper.endpoint has unsupported scheme {}",
                url.scheme()
            ))),
            Err(e) => Err(DigestError::Configuration(format!(
                "api.serper.endpoint is not a valid URL: {e}"
            ))),
        }
    }
}

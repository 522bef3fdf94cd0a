//! Data models passed between pipeline stages.
//!
//! Every value here is produced once by one stage and handed forward; no stage
//! mutates another stage's output. The chain for one run is:
//!
//! - [`Article`]: a trusted, recent search hit (harvest)
//! - [`ArticleSummary`]: one per article (summarize)
//! - [`ClaimOutcome`]: one per key point (verify)
//! - [`VerifiedSummary`]: one per summary (aggregate)
//! - [`Digest`]: the compiled run output (compile)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A news article that passed the trust and recency filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    /// Publisher name reported by the search provider, or the URL's domain.
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub snippet: String,
    /// Full article text, only populated when content enrichment is enabled.
    pub content: Option<String>,
}

impl Article {
    /// Copy of this article carrying the given full text.
    pub fn with_content(&self, content: String) -> Article {
        Article {
            content: Some(content),
            ..self.clone()
        }
    }

    /// The text handed to the summarizer: full content when present, else the snippet.
    pub fn body(&self) -> &str {
        match self.content.as_deref() {
            Some(content) if !content.trim().is_empty() => content,
            _ => &self.snippet,
        }
    }
}

/// A summarized article. One-to-one with [`Article`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    /// Ordered key points; each one is verified as a separate claim.
    pub key_points: Vec<String>,
}

/// One corroborating search hit for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSource {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    PartiallyVerified,
    Unverified,
}

impl VerificationStatus {
    /// Lenient parse of a status label produced by the text-generation model.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace(['-', ' '], "_");
        match normalized.as_str() {
            "verified" => Some(VerificationStatus::Verified),
            "partially_verified" | "partial" | "partially" => {
                Some(VerificationStatus::PartiallyVerified)
            }
            "unverified" | "not_verified" => Some(VerificationStatus::Unverified),
            _ => None,
        }
    }

    /// Human readable label used in the Markdown digest.
    pub fn label(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "Verified",
            VerificationStatus::PartiallyVerified => "Partially verified",
            VerificationStatus::Unverified => "Unverified",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::PartiallyVerified => "partially_verified",
            VerificationStatus::Unverified => "unverified",
        };
        f.write_str(s)
    }
}

/// Result of verifying a single claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    pub claim: String,
    pub sources: Vec<VerificationSource>,
    /// True when `sources` reached the configured minimum.
    pub corroborated: bool,
}

/// An [`ArticleSummary`] plus its verification result.
///
/// Strictly additive: the summary text and key points are carried unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedSummary {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    pub verification_sources: Vec<VerificationSource>,
    pub verification_status: VerificationStatus,
    /// Always within `[0.0, 1.0]`.
    pub confidence_score: f64,
    /// Corrections or clarifications suggested during verification.
    #[serde(default)]
    pub corrections: Vec<String>,
}

/// The compiled output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub query: String,
    pub stories: Vec<VerifiedSummary>,
    /// Rendered Markdown; the only artifact that gets persisted as a digest file.
    #[serde(skip)]
    pub markdown: String,
}

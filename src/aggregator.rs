//! Combine per-claim outcomes into one [`VerifiedSummary`].
//!
//! Sources from every claim are kept, repeats included. With no sources at
//! all the summary is `unverified` with confidence 0.0, whatever a verdict
//! says. Otherwise a verdict's status and confidence win where present, and
//! the computed values fill the gaps:
//!
//! - status: `verified` if every claim is corroborated, else `partially_verified`
//! - confidence: `(corroborated + 0.5 * partially_supported) / claims`

use crate::judge::JudgeVerdict;
use crate::models::{ArticleSummary, ClaimOutcome, VerificationStatus, VerifiedSummary};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct VerificationAggregator;

impl VerificationAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(
        &self,
        summary: &ArticleSummary,
        outcomes: &[ClaimOutcome],
        verdict: Option<&JudgeVerdict>,
    ) -> VerifiedSummary {
        let sources: Vec<_> = outcomes
            .iter()
            .flat_map(|o| o.sources.iter().cloned())
            .collect();
        let corrections = verdict.map(|v| v.corrections.clone()).unwrap_or_default();

        let (status, confidence) = if sources.is_empty() {
            (VerificationStatus::Unverified, 0.0)
        } else {
            let (computed_status, computed_confidence) = computed(outcomes);
            let status = verdict.and_then(|v| v.status).unwrap_or(computed_status);
            let confidence = verdict
                .and_then(|v| v.confidence)
                .unwrap_or(computed_confidence);
            (status, clamp_confidence(confidence))
        };

        debug!(
            url = %summary.url,
            claims = outcomes.len(),
            sources = sources.len(),
            %status,
            confidence,
            "Aggregated verification"
        );

        VerifiedSummary {
            summary: summary.clone(),
            verification_sources: sources,
            verification_status: status,
            confidence_score: confidence,
            corrections,
        }
    }
}

fn computed(outcomes: &[ClaimOutcome]) -> (VerificationStatus, f64) {
    if outcomes.is_empty() {
        return (VerificationStatus::Unverified, 0.0);
    }
    let corroborated = outcomes.iter().filter(|o| o.corroborated).count();
    let partial = outcomes
        .iter()
        .filter(|o| !o.corroborated && !o.sources.is_empty())
        .count();

    let status = if corroborated == outcomes.len() {
        VerificationStatus::Verified
    } else {
        VerificationStatus::PartiallyVerified
    };
    let confidence = (corroborated as f64 + 0.5 * partial as f64) / outcomes.len() as f64;
    (status, confidence)
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

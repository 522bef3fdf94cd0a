//! Verification judgment delegated to the text-generation model.
//!
//! The model sees the summary, its claims and the trusted sources found for
//! each, and replies with a status, a confidence and optional corrections.
//! Every field is optional; anything missing or out of range is dropped here
//! and the aggregator falls back to its own computed values.

use crate::api::AskAsync;
use crate::error::Result;
use crate::models::{ArticleSummary, ClaimOutcome, VerificationStatus};
use crate::summarizer::extract_json;
use crate::utils::truncate_for_log;
use serde::Deserialize;
use std::fmt::Write;
use tracing::{debug, instrument, warn};

/// Validated verdict from the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JudgeVerdict {
    pub status: Option<VerificationStatus>,
    pub confidence: Option<f64>,
    pub corrections: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VerdictReply {
    #[serde(default, alias = "verification_status")]
    status: Option<String>,
    #[serde(default, alias = "confidence_score")]
    confidence: Option<f64>,
    #[serde(default, alias = "clarifications")]
    corrections: Option<Vec<String>>,
}

pub struct VerificationJudge<A> {
    ask: A,
}

impl<A: AskAsync> VerificationJudge<A> {
    pub fn new(ask: A) -> Self {
        Self { ask }
    }

    /// Ask the model for a verdict. Returns `None` when the reply is unusable.
    #[instrument(level = "info", skip_all, fields(url = %summary.url))]
    pub async fn judge(
        &self,
        summary: &ArticleSummary,
        outcomes: &[ClaimOutcome],
    ) -> Result<Option<JudgeVerdict>> {
        let reply = self.ask.ask(&judge_prompt(summary, outcomes)).await?;
        Ok(parse_verdict(&reply))
    }
}

fn judge_prompt(summary: &ArticleSummary, outcomes: &[ClaimOutcome]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Title: {}", summary.title);
    let _ = writeln!(prompt, "Source: {} ({})", summary.source, summary.url);
    let _ = writeln!(prompt, "Summary: {}\n", summary.summary);
    let _ = writeln!(prompt, "Claims and trusted sources:");
    for (i, outcome) in outcomes.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, outcome.claim);
        if outcome.sources.is_empty() {
            let _ = writeln!(prompt, "   - no trusted sources found");
        }
        for source in &outcome.sources {
            let _ = writeln!(
                prompt,
                "   - {} [{}] {}: {}",
                source.title, source.source, source.url, source.snippet
            );
        }
    }
    prompt
}

/// Validate a model reply into a [`JudgeVerdict`].
pub fn parse_verdict(reply: &str) -> Option<JudgeVerdict> {
    let parsed: VerdictReply = match serde_json::from_str(extract_json(reply)) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, reply = %truncate_for_log(reply, 300), "Verdict reply is not conforming JSON");
            return None;
        }
    };

    let status = parsed.status.as_deref().and_then(|label| {
        let status = VerificationStatus::from_label(label);
        if status.is_none() {
            debug!(%label, "Ignoring unknown verification status");
        }
        status
    });
    let confidence = parsed
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));
    let corrections = parsed
        .corrections
        .unwrap_or_default()
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    Some(JudgeVerdict {
        status,
        confidence,
        corrections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures::ScriptedAsk;
    use crate::models::VerificationSource;
    use chrono::Utc;

    fn summary() -> ArticleSummary {
        ArticleSummary {
            title: "AI chip breakthrough".to_string(),
            url: "https://reuters.com/chip".to_string(),
            source: "Reuters".to_string(),
            published_at: Utc::now(),
            summary: "A new chip.".to_string(),
            key_points: vec!["Doubles throughput".to_string()],
        }
    }

    #[test]
    fn test_parse_full_verdict() {
        let verdict = parse_verdict(
            r#"{"status": "partially verified", "confidence": 0.7, "corrections": ["Ships in Q4, not Q3", " "]}"#,
        )
        .unwrap();
        assert_eq!(verdict.status, Some(VerificationStatus::PartiallyVerified));
        assert_eq!(verdict.confidence, Some(0.7));
        assert_eq!(verdict.corrections, vec!["Ships in Q4, not Q3"]);
    }

    #[test]
    fn test_parse_clamps_and_drops_bad_values() {
        let verdict = parse_verdict(r#"{"status": "maybe", "confidence": 1.8}"#).unwrap();
        assert_eq!(verdict.status, None);
        assert_eq!(verdict.confidence, Some(1.0));
        assert!(verdict.corrections.is_empty());

        let verdict = parse_verdict(r#"{"confidence_score": -3}"#).unwrap();
        assert_eq!(verdict.confidence, Some(0.0));
    }

    #[test]
    fn test_parse_non_json_is_none() {
        assert_eq!(parse_verdict("Looks fine to me."), None);
    }

    #[tokio::test]
    async fn test_judge_prompt_lists_claims_and_sources() {
        let judge = VerificationJudge::new(ScriptedAsk::new(r#"{"status": "verified"}"#));
        let outcomes = vec![
            ClaimOutcome {
                claim: "Doubles throughput".to_string(),
                sources: vec![VerificationSource {
                    title: "Reuters confirms".to_string(),
                    url: "https://reuters.com/a".to_string(),
                    snippet: "Confirmed".to_string(),
                    source: "reuters.com".to_string(),
                    date: None,
                }],
                corroborated: false,
            },
            ClaimOutcome {
                claim: "Ships in Q3".to_string(),
                sources: vec![],
                corroborated: false,
            },
        ];

        let verdict = judge.judge(&summary(), &outcomes).await.unwrap().unwrap();
        assert_eq!(verdict.status, Some(VerificationStatus::Verified));

        let prompts = judge.ask.prompts.borrow();
        assert!(prompts[0].contains("1. Doubles throughput"));
        assert!(prompts[0].contains("Reuters confirms [reuters.com]"));
        assert!(prompts[0].contains("2. Ships in Q3"));
        assert!(prompts[0].contains("no trusted sources found"));
    }
}

//! Summarize stage: one [`ArticleSummary`] per [`Article`].
//!
//! The model is asked for JSON shaped like
//!
//! ```json
//! {"summary": "One or two paragraphs", "key_points": ["...", "..."]}
//! ```
//!
//! and the reply is validated at this boundary. Missing fields default to
//! empty, key points are cleaned and deduplicated, and a reply that is not
//! JSON at all is kept as the summary text with no key points. Cut-off JSON
//! is never published: it yields an empty summary.

use crate::api::AskAsync;
use crate::error::Result;
use crate::models::{Article, ArticleSummary};
use crate::utils::{looks_truncated, truncate_for_log};
use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Model reply for a summary request.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "keyPoints", alias = "key_takeaways")]
    pub key_points: Option<Vec<String>>,
}

pub struct Summarizer<A> {
    pub(crate) ask: A,
}

impl<A: AskAsync> Summarizer<A> {
    pub fn new(ask: A) -> Self {
        Self { ask }
    }

    /// Summarize one article. Generation failures propagate; odd replies do not.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn summarize(&self, article: &Article) -> Result<ArticleSummary> {
        let prompt = summary_prompt(article);
        let mut reply = self.ask.ask(&prompt).await?;

        if let Err(e) = serde_json::from_str::<SummaryResponse>(extract_json(&reply)) {
            if looks_truncated(&e) {
                warn!(error = %e, "Summary reply looks truncated; re-asking once");
                reply = self.ask.ask(&prompt).await?;
            }
        }

        let response = parse_summary_reply(&reply);
        let summary = ArticleSummary {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            published_at: article.published_at,
            summary: response.summary.unwrap_or_default(),
            key_points: clean_key_points(response.key_points.unwrap_or_default()),
        };
        info!(key_points = summary.key_points.len(), "Summarized article");
        Ok(summary)
    }
}

fn summary_prompt(article: &Article) -> String {
    format!(
        "Title: {}\nSource: {}\nPublished: {}\nURL: {}\n\nContent:\n{}",
        article.title,
        article.source,
        article.published_at.to_rfc3339(),
        article.url,
        article.body()
    )
}

/// Validate a model reply into a [`SummaryResponse`].
pub fn parse_summary_reply(reply: &str) -> SummaryResponse {
    match serde_json::from_str::<SummaryResponse>(extract_json(reply)) {
        Ok(response) => response,
        Err(e) if looks_truncated(&e) => {
            warn!(
                error = %e,
                reply = %truncate_for_log(reply, 300),
                "Summary reply is cut-off JSON; leaving summary empty"
            );
            SummaryResponse::default()
        }
        Err(e) => {
            debug!(
                error = %e,
                reply = %truncate_for_log(reply, 300),
                "Summary reply is not conforming JSON; using it as plain text"
            );
            let text = reply.trim();
            SummaryResponse {
                summary: (!text.is_empty()).then(|| text.to_string()),
                key_points: None,
            }
        }
    }
}

/// Strip a Markdown code fence around a JSON reply, if present.
pub(crate) fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn clean_key_points(points: Vec<String>) -> Vec<String> {
    points
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unique()
        .collect()
}

//! Markdown rendering of a digest.
//!
//! Layout:
//!
//! ```text
//! # AI News Digest: 2025-05-06
//! overview line
//! ## Main Stories
//! ### Title (one per story, linked from its source line)
//! ## Sources and Verification
//! | Story | Source | Status | Confidence |
//! ```

use crate::models::{VerificationStatus, VerifiedSummary};
use crate::utils::slugify_title;
use chrono::NaiveDate;
use std::fmt::Write;

pub const DIGEST_TITLE: &str = "AI News Digest";

/// Render the compiled digest. An empty story list still renders every section.
pub fn digest_to_markdown(date: NaiveDate, lookback_hours: i64, stories: &[VerifiedSummary]) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# {DIGEST_TITLE}: {date}\n");
    let _ = writeln!(md, "{}\n", overview(lookback_hours, stories));

    let _ = writeln!(md, "## Main Stories\n");
    if stories.is_empty() {
        let _ = writeln!(
            md,
            "_No qualifying AI news stories were found in the last {lookback_hours} hours._\n"
        );
    }
    for story in stories {
        write_story(&mut md, story);
    }

    let _ = writeln!(md, "## Sources and Verification\n");
    if stories.is_empty() {
        let _ = writeln!(md, "_Nothing to verify._");
    } else {
        let _ = writeln!(md, "| Story | Source | Status | Confidence |");
        let _ = writeln!(md, "|-------|--------|--------|------------|");
        for story in stories {
            let _ = writeln!(
                md,
                "| [{}](#{}) | {} | {} | {:.0}% |",
                escape_table(&escape_link_text(&story.summary.title)),
                slugify_title(&story.summary.title),
                escape_table(&story.summary.source),
                story.verification_status.label(),
                story.confidence_score * 100.0
            );
        }
    }

    md
}

fn overview(lookback_hours: i64, stories: &[VerifiedSummary]) -> String {
    if stories.is_empty() {
        return format!("No stories from trusted sources in the last {lookback_hours} hours.");
    }
    let count = |status: VerificationStatus| {
        stories
            .iter()
            .filter(|s| s.verification_status == status)
            .count()
    };
    format!(
        "{} {} from trusted sources in the last {} hours: {} verified, {} partially verified, {} unverified.",
        stories.len(),
        if stories.len() == 1 { "story" } else { "stories" },
        lookback_hours,
        count(VerificationStatus::Verified),
        count(VerificationStatus::PartiallyVerified),
        count(VerificationStatus::Unverified),
    )
}

fn write_story(md: &mut String, story: &VerifiedSummary) {
    let s = &story.summary;
    let _ = writeln!(md, "### {}\n", escape_link_text(&s.title));
    let _ = writeln!(
        md,
        "*[{}]({}) · {}*\n",
        escape_link_text(&s.source),
        s.url,
        s.published_at.format("%Y-%m-%d %H:%M UTC")
    );
    if !s.summary.trim().is_empty() {
        let _ = writeln!(md, "{}\n", s.summary.trim());
    }

    if !s.key_points.is_empty() {
        let _ = writeln!(md, "**Key points**\n");
        for point in &s.key_points {
            let _ = writeln!(md, "- {point}");
        }
        md.push('\n');
    }

    let _ = writeln!(
        md,
        "**Verification:** {} (confidence {:.0}%)\n",
        story.verification_status.label(),
        story.confidence_score * 100.0
    );

    if !story.verification_sources.is_empty() {
        for source in &story.verification_sources {
            let date = source
                .date
                .map(|d| format!(", {d}"))
                .unwrap_or_default();
            let _ = writeln!(
                md,
                "- [{}]({}) ({}{})",
                escape_link_text(&source.title),
                source.url,
                source.source,
                date
            );
        }
        md.push('\n');
    }

    if !story.corrections.is_empty() {
        let _ = writeln!(md, "**Corrections and clarifications**\n");
        for correction in &story.corrections {
            let _ = writeln!(md, "- {correction}");
        }
        md.push('\n');
    }
}

fn escape_table(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Backslash-escape the brackets that would end or nest Markdown link text.
fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleSummary, VerificationSource};
    use chrono::{TimeZone, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    fn story(title: &str, status: VerificationStatus, confidence: f64) -> VerifiedSummary {
        VerifiedSummary {
            summary: ArticleSummary {
                title: title.to_string(),
                url: "https://reuters.com/chip".to_string(),
                source: "Reuters".to_string(),
                published_at: Utc.with_ymd_and_hms(2025, 5, 6, 9, 30, 0).unwrap(),
                summary: "Chipmaker unveils accelerator.".to_string(),
                key_points: vec!["Doubles throughput".to_string()],
            },
            verification_sources: vec![VerificationSource {
                title: "Confirmation".to_string(),
                url: "https://arxiv.org/abs/1".to_string(),
                snippet: "s".to_string(),
                source: "arxiv.org".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 5, 5),
            }],
            verification_status: status,
            confidence_score: confidence,
            corrections: vec!["Ships in Q4".to_string()],
        }
    }

    #[test]
    fn test_empty_digest_is_well_formed() {
        let md = digest_to_markdown(date(), 24, &[]);
        assert!(md.starts_with("# AI News Digest: 2025-05-06"));
        assert!(md.contains("## Main Stories"));
        assert!(md.contains("No qualifying AI news stories were found in the last 24 hours"));
        assert!(md.contains("## Sources and Verification"));
    }

    #[test]
    fn test_story_sections() {
        let stories = vec![
            story("AI chip breakthrough", VerificationStatus::Verified, 0.9),
            story("Model | release", VerificationStatus::Unverified, 0.0),
        ];
        let md = digest_to_markdown(date(), 24, &stories);

        assert!(md.contains("2 stories from trusted sources in the last 24 hours: 1 verified, 0 partially verified, 1 unverified."));
        assert!(md.contains("### AI chip breakthrough"));
        assert!(md.contains("*[Reuters](https://reuters.com/chip) · 2025-05-06 09:30 UTC*"));
        assert!(md.contains("- Doubles throughput"));
        assert!(md.contains("**Verification:** Verified (confidence 90%)"));
        assert!(md.contains("- [Confirmation](https://arxiv.org/abs/1) (arxiv.org, 2025-05-05)"));
        assert!(md.contains("- Ships in Q4"));
        assert!(md.contains("| [AI chip breakthrough](#ai-chip-breakthrough) | Reuters | Verified | 90% |"));
        assert!(md.contains("| [Model \\| release](#model--release) | Reuters | Unverified | 0% |"));
    }

    #[test]
    fn test_brackets_in_titles_are_escaped() {
        let mut s = story("Model [beta] ships", VerificationStatus::Verified, 1.0);
        s.summary.source = "Wire [EU]".to_string();
        s.verification_sources[0].title = "Paper [v2]".to_string();
        let md = digest_to_markdown(date(), 24, &[s]);

        assert!(md.contains("### Model \\[beta\\] ships"));
        assert!(md.contains("*[Wire \\[EU\\]](https://reuters.com/chip) · "));
        assert!(md.contains("- [Paper \\[v2\\]](https://arxiv.org/abs/1) (arxiv.org, 2025-05-05)"));
        assert!(md.contains("| [Model \\[beta\\] ships](#model-beta-ships) | Wire [EU] | Verified | 100% |"));
    }

    #[test]
    fn test_story_order_is_preserved() {
        let stories = vec![
            story("First", VerificationStatus::Verified, 1.0),
            story("Second", VerificationStatus::PartiallyVerified, 0.5),
        ];
        let md = digest_to_markdown(date(), 24, &stories);
        assert!(md.find("### First").unwrap() < md.find("### Second").unwrap());
        assert!(md.contains("1 verified, 1 partially verified, 0 unverified"));
    }
}

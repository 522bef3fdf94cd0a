//! Full-text enrichment for harvested articles.
//!
//! Search hits only carry a snippet. When enabled, each article page is
//! downloaded and its paragraph text extracted so the summarizer has more to
//! work with. Enrichment is best effort: a failed download leaves the article
//! as it was.

use crate::error::{DigestError, Result};
use crate::models::Article;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

static ARTICLE_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("valid article selector"));
static ALL_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid paragraph selector"));

/// Paragraphs shorter than this are usually captions, bylines or UI chrome.
const MIN_PARAGRAPH_CHARS: usize = 40;

pub struct ContentFetcher {
    client: reqwest::Client,
}

impl ContentFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DigestError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Copy of `article` with its page text attached, or an unchanged copy on failure.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn enrich(&self, article: &Article) -> Article {
        match self.fetch_text(&article.url).await {
            Ok(Some(text)) => {
                info!(bytes = text.len(), "Fetched article content");
                article.with_content(text)
            }
            Ok(None) => {
                debug!("No paragraph text found on page");
                article.clone()
            }
            Err(e) => {
                warn!(error = %e, "Article content fetch failed; keeping snippet");
                article.clone()
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DigestError::Status {
                status: status.as_u16(),
                message: format!("fetching {url}"),
            });
        }
        let body = resp.text().await?;
        Ok(extract_article_text(&body))
    }
}

/// Paragraph text of an HTML page, preferring paragraphs inside `<article>`.
pub fn extract_article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let collect = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(|p| {
                p.text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| text.chars().count() >= MIN_PARAGRAPH_CHARS)
            .collect()
    };

    let mut paragraphs = collect(&*ARTICLE_PARAGRAPHS);
    if paragraphs.is_empty() {
        paragraphs = collect(&*ALL_PARAGRAPHS);
    }
    (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_paragraphs() {
        let html = r#"
            <html><body>
              <nav><p>This navigation paragraph is long enough to count as text.</p></nav>
              <article>
                <p>The company said its new accelerator doubles training throughput.</p>
                <p>Short caption</p>
                <p>Shipments are expected to begin   in the third quarter of the year.</p>
              </article>
            </body></html>
        "#;
        let text = extract_article_text(html).unwrap();
        assert_eq!(
            text,
            "The company said its new accelerator doubles training throughput.\n\n\
             Shipments are expected to begin in the third quarter of the year."
        );
    }

    #[test]
    fn test_falls_back_to_all_paragraphs() {
        let html = "<div><p>A page without an article element still has readable text.</p></div>";
        let text = extract_article_text(html).unwrap();
        assert!(text.starts_with("A page without an article element"));
    }

    #[test]
    fn test_no_text_is_none() {
        assert_eq!(extract_article_text("<html><body><p>tiny</p></body></html>"), None);
        assert_eq!(extract_article_text(""), None);
    }
}

//! Harvest stage: turn one news search into a bounded list of articles.

use crate::config::DigestConfig;
use crate::models::Article;
use crate::search::{RawHit, SearchBackend, SearchRequest};
use crate::temporal::{parse_recency, within_lookback};
use crate::trust::{TrustFilter, extract_domain};
use tracing::{debug, error, info, instrument};

/// Results requested per news search.
pub const NEWS_PAGE_SIZE: usize = 10;

pub struct ArticleFetcher<'a, S> {
    backend: &'a S,
    trust: &'a TrustFilter,
    lookback_hours: i64,
    max_articles: usize,
}

impl<'a, S: SearchBackend> ArticleFetcher<'a, S> {
    pub fn new(backend: &'a S, trust: &'a TrustFilter, config: &DigestConfig) -> Self {
        Self {
            backend,
            trust,
            lookback_hours: config.time_settings.lookback_hours,
            max_articles: config.article_limits.max_articles_per_day,
        }
    }

    /// Fetch trusted, recent articles for `query`, in provider order.
    ///
    /// The cap is applied after filtering. A failed search request yields an
    /// empty list; the failure is logged and not retried.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, query: &str) -> Vec<Article> {
        let request = SearchRequest::news(query, NEWS_PAGE_SIZE);
        let hits = match self.backend.search(&request).await {
            Ok(hits) => hits,
            Err(e) => {
                error!(
                    error = %e,
                    transport = e.is_transport(),
                    "News search failed; continuing with no articles"
                );
                return Vec::new();
            }
        };
        info!(count = hits.len(), "Received news hits");

        let articles: Vec<Article> = hits
            .iter()
            .filter_map(|hit| self.accept(hit))
            .take(self.max_articles)
            .collect();

        info!(
            count = articles.len(),
            max = self.max_articles,
            "Harvested articles"
        );
        articles
    }

    fn accept(&self, hit: &RawHit) -> Option<Article> {
        if !self.trust.is_trusted(&hit.link) {
            debug!(link = %hit.link, "Rejected hit: untrusted or malformed link");
            return None;
        }
        let domain = extract_domain(&hit.link).ok()?;

        let Some(published_at) = hit.date.as_deref().and_then(parse_recency) else {
            debug!(link = %hit.link, date = ?hit.date, "Rejected hit: no usable date");
            return None;
        };
        if !within_lookback(published_at, self.lookback_hours) {
            debug!(link = %hit.link, %published_at, "Rejected hit: outside lookback window");
            return None;
        }

        Some(Article {
            title: hit.title.clone(),
            url: hit.link.clone(),
            source: hit
                .source
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(domain),
            published_at,
            snippet: hit.snippet.clone(),
            content: None,
        })
    }
}

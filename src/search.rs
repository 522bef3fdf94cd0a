//! Search backend seam.
//!
//! [`SearchBackend`] is the only way the pipeline reaches the network for
//! search. [`SerperClient`] implements it against the Serper.dev API; tests
//! plug in fixture backends.
//!
//! Transport problems (network errors, timeouts, non-2xx statuses, a body
//! that is not JSON) are returned as errors. Individual hits that fail to
//! deserialize are skipped and logged, so one bad entry never costs the
//! whole response.

use crate::error::{DigestError, Result};
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    News,
    Organic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub result_type: ResultType,
    pub count: usize,
}

impl SearchRequest {
    pub fn news(query: &str, count: usize) -> Self {
        Self {
            query: query.to_string(),
            result_type: ResultType::News,
            count,
        }
    }

    pub fn organic(query: &str, count: usize) -> Self {
        Self {
            query: query.to_string(),
            result_type: ResultType::Organic,
            count,
        }
    }
}

/// One search hit as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

pub trait SearchBackend {
    /// Run one search. Hits come back in provider (relevance) order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawHit>>;
}

/// Serper.dev client.
pub struct SerperClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for SerperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerperClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    news: Vec<serde_json::Value>,
    #[serde(default)]
    organic: Vec<serde_json::Value>,
}

impl SerperClient {
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(DigestError::Configuration(
                "SERPER_API_KEY is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DigestError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

impl SearchBackend for SerperClient {
    #[instrument(level = "info", skip_all, fields(query = %request.query, kind = ?request.result_type, count = request.count))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawHit>> {
        let t0 = Instant::now();
        let body = SerperRequest {
            q: &request.query,
            num: request.count,
            kind: match request.result_type {
                ResultType::News => Some("news"),
                ResultType::Organic => None,
            },
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %truncate_for_log(&text, 300), "Serper returned an error status");
            return Err(DigestError::Status {
                status: status.as_u16(),
                message: truncate_for_log(&text, 300),
            });
        }
        debug!(body = %truncate_for_log(&text, 1000), "Serper raw response");

        let hits = parse_response(&text, request.result_type)?;
        info!(
            count = hits.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Serper search complete"
        );
        Ok(hits)
    }
}

/// Decode a Serper response body, keeping the hit list for `kind`.
pub fn parse_response(body: &str, kind: ResultType) -> Result<Vec<RawHit>> {
    let data: SerperResponse = serde_json::from_str(body)
        .map_err(|e| DigestError::Transport(format!("malformed search response: {e}")))?;
    let items = match kind {
        ResultType::News => data.news,
        ResultType::Organic => data.organic,
    };

    let hits = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<RawHit>(item) {
            Ok(hit) => Some(hit),
            Err(e) => {
                warn!(index = i, error = %e, "Skipping malformed search hit");
                None
            }
        })
        .collect();
    Ok(hits)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::cell::RefCell;

    /// Canned search backend. Records every request it receives.
    pub struct FixtureSearcher {
        outcome: std::result::Result<Vec<RawHit>, String>,
        pub requests: RefCell<Vec<SearchRequest>>,
    }

    impl FixtureSearcher {
        pub fn new(hits: Vec<RawHit>) -> Self {
            Self {
                outcome: Ok(hits),
                requests: RefCell::new(Vec::new()),
            }
        }

        /// A backend whose every request fails at the transport level.
        pub fn failing(message: &str) -> Self {
            Self {
                outcome: Err(message.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl SearchBackend for FixtureSearcher {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<RawHit>> {
            self.requests.borrow_mut().push(request.clone());
            match &self.outcome {
                Ok(hits) => Ok(hits.iter().take(request.count).cloned().collect()),
                Err(message) => Err(DigestError::Transport(message.clone())),
            }
        }
    }

    pub fn hit(title: &str, link: &str, date: Option<&str>) -> RawHit {
        RawHit {
            title: title.to_string(),
            link: link.to_string(),
            snippet: format!("{title} snippet"),
            source: None,
            date: date.map(str::to_string),
        }
    }
}

//! Claim verification against trusted sources.
//!
//! Each claim is searched once, asking for `min_sources` results. Only hits
//! whose host is listed verbatim in the trusted-domain configuration count:
//! subdomains, a `www.` label or an explicit port all fail the match. A failed search is a hard error here:
//! an unverifiable claim must never look verified.

use crate::config::DigestConfig;
use crate::error::Result;
use crate::models::{ClaimOutcome, VerificationSource};
use crate::search::{RawHit, SearchBackend, SearchRequest};
use crate::temporal::parse_absolute_date;
use crate::trust::{TrustFilter, extract_host};
use tracing::{debug, error, info, instrument, warn};

pub struct ClaimVerifier<'a, S> {
    backend: &'a S,
    trust: &'a TrustFilter,
    min_sources: usize,
}

impl<'a, S: SearchBackend> ClaimVerifier<'a, S> {
    pub fn new(backend: &'a S, trust: &'a TrustFilter, config: &DigestConfig) -> Self {
        Self {
            backend,
            trust,
            min_sources: config.verification.min_sources,
        }
    }

    /// Trusted sources for `claim`, in provider order.
    #[instrument(level = "info", skip(self))]
    pub async fn verify(&self, claim: &str) -> Result<Vec<VerificationSource>> {
        let request = SearchRequest::organic(claim, self.min_sources);
        let hits = self.backend.search(&request).await.map_err(|e| {
            error!(error = %e, "Verification search failed");
            e
        })?;

        let sources: Vec<VerificationSource> =
            hits.iter().filter_map(|hit| self.accept(hit)).collect();
        info!(count = sources.len(), "Found verification sources");
        Ok(sources)
    }

    /// Whether `claim` reaches the minimum number of trusted sources.
    pub async fn is_corroborated(&self, claim: &str) -> Result<bool> {
        let sources = self.verify(claim).await?;
        Ok(sources.len() >= self.min_sources)
    }

    /// Verify each claim in order, stopping at the first failed search.
    pub async fn verify_claims(&self, claims: &[String]) -> Result<Vec<ClaimOutcome>> {
        let mut outcomes = Vec::with_capacity(claims.len());
        for claim in claims {
            let sources = self.verify(claim).await?;
            outcomes.push(ClaimOutcome {
                claim: claim.clone(),
                corroborated: sources.len() >= self.min_sources,
                sources,
            });
        }
        Ok(outcomes)
    }

    fn accept(&self, hit: &RawHit) -> Option<VerificationSource> {
        let host = match extract_host(&hit.link) {
            Ok(host) => host,
            Err(e) => {
                warn!(link = %hit.link, error = %e, "Skipping search hit with unusable link");
                return None;
            }
        };
        if !self.trust.is_exact_domain(&host) {
            debug!(%host, "Ignoring source outside trusted domains");
            return None;
        }
        Some(VerificationSource {
            title: hit.title.clone(),
            url: hit.link.clone(),
            snippet: hit.snippet.clone(),
            source: host,
            date: hit.date.as_deref().and_then(parse_absolute_date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;
    use crate::search::ResultType;
    use crate::search::fixtures::{FixtureSearcher, hit};
    use chrono::NaiveDate;

    fn config(min_sources: usize) -> DigestConfig {
        let yaml = format!(
            "verification:\n  trusted_domains: [reuters.com, arxiv.org, theverge.com]\n  min_sources: {min_sources}\n\
             time_settings:\n  lookback_hours: 24\n\
             article_limits:\n  max_articles_per_day: 10\n"
        );
        DigestConfig::from_yaml(&yaml).unwrap()
    }

    fn two_trusted_hits() -> Vec<RawHit> {
        vec![
            hit("Reuters confirms", "https://reuters.com/a", Some("2025-05-05")),
            hit("Paper", "https://arxiv.org/abs/1234", Some("3 hours ago")),
        ]
    }

    #[tokio::test]
    async fn test_corroborated_with_enough_sources() {
        let cfg = config(2);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(two_trusted_hits());
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        assert!(verifier.is_corroborated("Chip doubles throughput").await.unwrap());
    }

    #[tokio::test]
    async fn test_not_corroborated_when_minimum_is_higher() {
        let cfg = config(3);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(two_trusted_hits());
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        assert!(!verifier.is_corroborated("Chip doubles throughput").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_requests_min_sources_organic_results() {
        let cfg = config(3);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(vec![]);
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        verifier.verify("claim").await.unwrap();
        let requests = backend.requests.borrow();
        assert_eq!(requests[0].result_type, ResultType::Organic);
        assert_eq!(requests[0].count, 3);
        assert_eq!(requests[0].query, "claim");
    }

    #[tokio::test]
    async fn test_verify_uses_exact_domain_match() {
        let cfg = config(10);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(vec![
            hit("sub", "https://blogs.reuters.com/x", None),
            hit("www", "https://www.reuters.com/w", None),
            hit("port", "https://reuters.com:8443/p", None),
            hit("exact", "https://reuters.com/y", None),
            hit("other", "https://example.com/z", None),
            hit("broken", "::not a url::", None),
        ]);
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        let sources = verifier.verify("claim").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "exact");
        assert_eq!(sources[0].source, "reuters.com");
    }

    #[tokio::test]
    async fn test_www_host_does_not_corroborate() {
        let cfg = config(2);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(vec![
            hit("Reuters", "https://www.reuters.com/a", None),
            hit("Paper", "https://arxiv.org/abs/1234", None),
        ]);
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        let sources = verifier.verify("claim").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source, "arxiv.org");
        assert!(!verifier.is_corroborated("claim").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_parses_only_absolute_dates() {
        let cfg = config(2);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(two_trusted_hits());
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        let sources = verifier.verify("claim").await.unwrap();
        assert_eq!(sources[0].date, NaiveDate::from_ymd_opt(2025, 5, 5));
        assert_eq!(sources[1].date, None);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let cfg = config(2);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::failing("timed out");
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        let err = verifier.verify("claim").await.unwrap_err();
        assert!(matches!(err, DigestError::Transport(_)));
        assert!(verifier.is_corroborated("claim").await.is_err());
    }

    #[tokio::test]
    async fn test_verify_claims_keeps_order_and_flags() {
        let cfg = config(2);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(two_trusted_hits());
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        let claims = vec!["first".to_string(), "second".to_string()];
        let outcomes = verifier.verify_claims(&claims).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].claim, "first");
        assert_eq!(outcomes[1].claim, "second");
        assert!(outcomes.iter().all(|o| o.corroborated && o.sources.len() == 2));
    }

    #[tokio::test]
    async fn test_verify_is_repeatable() {
        let cfg = config(2);
        let trust = TrustFilter::new(&cfg.verification.trusted_domains);
        let backend = FixtureSearcher::new(two_trusted_hits());
        let verifier = ClaimVerifier::new(&backend, &trust, &cfg);

        let first = verifier.verify("claim").await.unwrap();
        let second = verifier.verify("claim").await.unwrap();
        assert_eq!(first, second);
    }
}

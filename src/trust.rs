//! Trusted-domain checks.
//!
//! Two matching rules are in play:
//!
//! - [`TrustFilter::is_trusted`] accepts a URL whose domain equals a trusted
//!   domain or ends with it on a label boundary (`www.tech.reuters.com`
//!   matches `reuters.com`, `notreuters.com` does not). Used at article
//!   ingestion.
//! - [`TrustFilter::is_exact_domain`] accepts only a host (with any explicit
//!   port) listed verbatim, as returned by [`extract_host`]. No `www.`
//!   stripping happens on this path. Used when counting corroborating
//!   sources for a claim.

use crate::error::{DigestError, Result};
use tracing::{debug, warn};
use url::Url;

/// Domain of `url`, lowercased, with a leading `www.` label removed.
pub fn extract_domain(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| DigestError::Parse(format!("invalid URL {url:?}: {e}")))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DigestError::Parse(format!("URL {url:?} has no host")))?;
    let host = host.trim_end_matches('.').to_lowercase();
    Ok(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Host of `url` as written, plus `:port` when one is given explicitly.
///
/// Unlike [`extract_domain`] this keeps a leading `www.` label.
pub fn extract_host(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| DigestError::Parse(format!("invalid URL {url:?}: {e}")))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DigestError::Parse(format!("URL {url:?} has no host")))?;
    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct TrustFilter {
    /// Normalized suffixes for [`TrustFilter::is_trusted`].
    trusted: Vec<String>,
    /// Entries as configured, lowercased only.
    listed: Vec<String>,
}

impl TrustFilter {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let listed: Vec<String> = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        let trusted = listed
            .iter()
            .map(|d| normalize_domain(d))
            .filter(|d| !d.is_empty())
            .collect();
        Self { trusted, listed }
    }

    /// Whether the URL's domain equals or is a subdomain of a trusted domain.
    ///
    /// Malformed URLs are untrusted; the parse failure is logged.
    pub fn is_trusted(&self, url: &str) -> bool {
        match extract_domain(url) {
            Ok(domain) => self.is_trusted_domain(&domain),
            Err(e) => {
                warn!(%url, error = %e, "Could not extract domain; treating as untrusted");
                false
            }
        }
    }

    /// Suffix match of an already-extracted domain.
    pub fn is_trusted_domain(&self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        let trusted = self.trusted.iter().any(|t| {
            domain == *t
                || domain
                    .strip_suffix(t.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });
        if !trusted {
            debug!(%domain, "Domain not trusted");
        }
        trusted
    }

    /// Exact match of a host from [`extract_host`] against the configured list.
    pub fn is_exact_domain(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.listed.iter().any(|t| *t == host)
    }
}

fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().trim_matches('.').to_lowercase();
    d.strip_prefix("www.").map(str::to_string).unwrap_or(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> TrustFilter {
        TrustFilter::new(["reuters.com", "theverge.com", "arxiv.org"])
    }

    #[test]
    fn test_extract_domain_strips_www() {
        assert_eq!(extract_domain("https://www.reuters.com/x").unwrap(), "reuters.com");
        assert_eq!(extract_domain("https://Tech.Reuters.com:443/x").unwrap(), "tech.reuters.com");
        assert_eq!(extract_domain("http://arxiv.org").unwrap(), "arxiv.org");
    }

    #[test]
    fn test_extract_domain_rejects_malformed() {
        assert!(matches!(extract_domain("not a url"), Err(DigestError::Parse(_))));
        assert!(extract_domain("").is_err());
        assert!(extract_domain("mailto:someone@reuters.com").is_err());
    }

    #[test]
    fn test_is_trusted_exact_and_www() {
        let f = filter();
        assert!(f.is_trusted("https://www.reuters.com/x"));
        assert!(f.is_trusted("https://reuters.com/x"));
    }

    #[test]
    fn test_is_trusted_requires_label_boundary() {
        let f = filter();
        assert!(!f.is_trusted("https://notreuters.com/x"));
        assert!(f.is_trusted("https://tech.reuters.com/x"));
        assert!(!f.is_trusted("https://reuters.com.evil.net/x"));
    }

    #[test]
    fn test_is_trusted_malformed_is_false() {
        let f = filter();
        assert!(!f.is_trusted("::::"));
        assert!(!f.is_trusted(""));
    }

    #[test]
    fn test_exact_domain_does_not_accept_subdomains() {
        let f = filter();
        assert!(f.is_exact_domain("reuters.com"));
        assert!(f.is_exact_domain("REUTERS.com"));
        assert!(!f.is_exact_domain("tech.reuters.com"));
        assert!(!f.is_exact_domain("www.reuters.com"));
        assert!(!f.is_exact_domain("reuters.com:8443"));
        assert!(f.is_trusted_domain("tech.reuters.com"));
    }

    #[test]
    fn test_extract_host_keeps_www_and_port() {
        assert_eq!(extract_host("https://www.reuters.com/a").unwrap(), "www.reuters.com");
        assert_eq!(extract_host("https://reuters.com:8443/b").unwrap(), "reuters.com:8443");
        assert_eq!(extract_host("https://Reuters.com/c").unwrap(), "reuters.com");
        assert!(matches!(extract_host("::not a url::"), Err(DigestError::Parse(_))));
    }

    #[test]
    fn test_configured_domains_are_normalized() {
        let f = TrustFilter::new([" WWW.Reuters.com ", "", ".arxiv.org"]);
        assert!(f.is_trusted("https://reuters.com/x"));
        assert!(f.is_trusted("https://arxiv.org/abs/1"));
        assert!(f.is_exact_domain("www.reuters.com"));
        assert!(!f.is_exact_domain("reuters.com"));
        assert!(!f.is_trusted("https://example.com"));
    }
}

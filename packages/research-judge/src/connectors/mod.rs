//! Source connector implementations.
//!
//! - `SemanticScholarConnector` - academic literature search (JSON API)
//! - `ArxivConnector` - preprint archive (Atom feed)
//! - `PubMedConnector` - biomedical literature, `medical` domain only
//! - `RateLimitedConnector` - wrapper that adds rate limiting

pub mod arxiv;
pub mod pubmed;
pub mod rate_limited;
pub mod semantic_scholar;

pub use arxiv::ArxivConnector;
pub use pubmed::PubMedConnector;
pub use rate_limited::{ConnectorExt, RateLimitedConnector};
pub use semantic_scholar::SemanticScholarConnector;

use std::sync::Arc;
use std::time::Duration;

use crate::error::ConnectorError;
use crate::security::Credentials;
use crate::traits::connector::SourceConnector;

/// User agent sent by every connector.
pub const USER_AGENT: &str = concat!("research-judge/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the connectors.
///
/// Falls back to a default client if the configured one cannot be built.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// The standard connector set, rate limited to each service's public quota.
///
/// Registration order (academic, preprint, domain) is the tie-break order
/// for equally scored evidence.
pub fn default_connectors(
    credentials: &Credentials,
    timeout: Duration,
) -> Vec<Arc<dyn SourceConnector>> {
    let client = http_client(timeout);

    let mut semantic_scholar = SemanticScholarConnector::new().with_client(client.clone());
    if let Some(key) = &credentials.semantic_scholar_api_key {
        semantic_scholar = semantic_scholar.with_api_key(key.clone());
    }

    let mut pubmed = PubMedConnector::new().with_client(client.clone());
    let pubmed_rps = if let Some(key) = &credentials.ncbi_api_key {
        pubmed = pubmed.with_api_key(key.clone());
        10
    } else {
        3
    };

    vec![
        Arc::new(semantic_scholar.rate_limited(1)),
        Arc::new(ArxivConnector::new().with_client(client).rate_limited(1)),
        Arc::new(pubmed.rate_limited(pubmed_rps)),
    ]
}

/// Map a transport failure.
pub(crate) fn http_error(e: reqwest::Error) -> ConnectorError {
    ConnectorError::Http(Box::new(e))
}

/// Reject non-success responses.
pub(crate) fn check_status(
    connector: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ConnectorError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ConnectorError::Status {
            connector: connector.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connectors_order() {
        let connectors = default_connectors(&Credentials::default(), Duration::from_secs(5));
        let names: Vec<&str> = connectors.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["semantic_scholar", "arxiv", "pubmed"]);
    }

    #[test]
    fn test_pubmed_only_for_medical() {
        let connectors = default_connectors(&Credentials::default(), Duration::from_secs(5));
        let applicable = |domain: &str| connectors.iter().filter(|c| c.applies_to(domain)).count();
        assert_eq!(applicable("medical"), 3);
        assert_eq!(applicable("legal"), 2);
    }
}

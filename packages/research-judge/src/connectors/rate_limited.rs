//! Rate-limited connector wrapper.
//!
//! Wraps any SourceConnector with rate limiting using the governor crate.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::ConnectorResult;
use crate::traits::connector::{RawCandidate, SourceConnector};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A connector wrapper that enforces a request quota.
///
/// Waiting for a permit counts against the dispatcher's per-call timeout.
pub struct RateLimitedConnector<C: SourceConnector> {
    inner: C,
    limiter: Arc<DefaultRateLimiter>,
}

impl<C: SourceConnector> RateLimitedConnector<C> {
    /// Allow `requests_per_second` searches per second (minimum 1).
    pub fn new(connector: C, requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        Self::with_quota(connector, Quota::per_second(rps))
    }

    pub fn with_quota(connector: C, quota: Quota) -> Self {
        Self {
            inner: connector,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: SourceConnector> SourceConnector for RateLimitedConnector<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn applies_to(&self, domain: &str) -> bool {
        self.inner.applies_to(domain)
    }

    async fn search(
        &self,
        question: &str,
        domain: &str,
        max_results: usize,
    ) -> ConnectorResult<Vec<RawCandidate>> {
        self.limiter.until_ready().await;
        self.inner.search(question, domain, max_results).await
    }
}

/// Extension trait for easy rate limiting.
pub trait ConnectorExt: SourceConnector + Sized {
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedConnector<Self> {
        RateLimitedConnector::new(self, requests_per_second)
    }
}

impl<C: SourceConnector + Sized> ConnectorExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConnector;
    use std::time::Instant;

    #[tokio::test]
    async fn test_rate_limiting() {
        // 2 requests per second
        let connector = MockConnector::new("mock").rate_limited(2);

        let start = Instant::now();
        for _ in 0..3 {
            connector.search("q", "general", 1).await.unwrap();
        }
        let elapsed = start.elapsed();

        // First is immediate, the other two wait
        assert!(elapsed.as_millis() >= 500, "Rate limiting not working: {:?}", elapsed);
        assert_eq!(connector.inner().requested_limits(), vec![1, 1, 1]);
    }

    #[test]
    fn test_delegates_identity() {
        let connector = MockConnector::new("pubmed").for_domain("medical").rate_limited(0);
        assert_eq!(connector.name(), "pubmed");
        assert!(connector.applies_to("medical"));
        assert!(!connector.applies_to("legal"));
    }
}

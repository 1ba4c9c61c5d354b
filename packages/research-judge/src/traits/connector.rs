//! Source connector trait for evidence retrieval.
//!
//! A connector wraps one research source (an academic search engine, a
//! preprint archive, a domain database) and returns raw candidates. The
//! dispatcher owns scoring, filtering and ranking so every source is
//! ranked on the same scale.
//!
//! ```rust,ignore
//! let connectors: Vec<Arc<dyn SourceConnector>> = vec![
//!     Arc::new(SemanticScholarConnector::new()),
//!     Arc::new(ArxivConnector::new()),
//!     Arc::new(PubMedConnector::new()),
//! ];
//! let dispatcher = RetrievalDispatcher::new(connectors, JudgeConfig::default());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConnectorResult;

/// An unscored search hit as returned by a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub title: String,

    /// Authors in publication order.
    pub authors: Vec<String>,

    /// Publication year (or full date) if the source reports one.
    pub year: Option<String>,

    /// Journal, conference or archive.
    pub venue: Option<String>,

    pub url: String,

    pub citation_count: Option<u32>,

    /// Abstract or summary text; empty when unavailable.
    pub abstract_text: String,
}

impl RawCandidate {
    /// Create a candidate with a title and URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the abstract.
    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = text.into();
        self
    }

    /// Set the authors.
    pub fn with_authors(mut self, authors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.authors = authors.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Set the publication year.
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Set the venue.
    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    /// Set the citation count.
    pub fn with_citations(mut self, count: u32) -> Self {
        self.citation_count = Some(count);
        self
    }
}

/// A research source the dispatcher can fan out to.
///
/// # Implementations
///
/// - `SemanticScholarConnector` - academic literature
/// - `ArxivConnector` - preprints
/// - `PubMedConnector` - medical literature (medical domain only)
/// - `RateLimitedConnector` - wraps any connector with a request quota
/// - `MockConnector` - for testing
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Short stable name used in logs and evidence provenance.
    fn name(&self) -> &str;

    /// Whether this connector should be queried for the given domain.
    fn applies_to(&self, _domain: &str) -> bool {
        true
    }

    /// Search for at most `max_results` candidates.
    ///
    /// Returning fewer (or zero) results is a success, not a failure.
    async fn search(
        &self,
        question: &str,
        domain: &str,
        max_results: usize,
    ) -> ConnectorResult<Vec<RawCandidate>>;
}

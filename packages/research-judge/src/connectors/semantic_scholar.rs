//! Semantic Scholar academic search connector.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{check_status, http_error};
use crate::error::{ConnectorError, ConnectorResult};
use crate::security::SecretString;
use crate::traits::connector::{RawCandidate, SourceConnector};

const NAME: &str = "semantic_scholar";
const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const FIELDS: &str = "title,authors,year,venue,url,citationCount,abstract";

/// API caps page size at 100.
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<Author>,
    year: Option<i32>,
    venue: Option<String>,
    url: Option<String>,
    citation_count: Option<u32>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

impl From<Paper> for RawCandidate {
    fn from(paper: Paper) -> Self {
        let url = paper
            .url
            .or_else(|| {
                paper
                    .paper_id
                    .map(|id| format!("https://www.semanticscholar.org/paper/{}", id))
            })
            .unwrap_or_default();

        RawCandidate {
            title: paper.title.unwrap_or_default(),
            authors: paper.authors.into_iter().filter_map(|a| a.name).collect(),
            year: paper.year.map(|y| y.to_string()),
            venue: paper.venue.filter(|v| !v.is_empty()),
            url,
            citation_count: paper.citation_count,
            abstract_text: paper.abstract_text.unwrap_or_default(),
        }
    }
}

/// Searches the Semantic Scholar Graph API.
pub struct SemanticScholarConnector {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl SemanticScholarConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Authenticate for a higher rate limit.
    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Point at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn parse(body: &str) -> ConnectorResult<Vec<RawCandidate>> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|e| ConnectorError::Parse {
                connector: NAME.to_string(),
                reason: e.to_string(),
            })?;
        Ok(response.data.into_iter().map(RawCandidate::from).collect())
    }
}

impl Default for SemanticScholarConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceConnector for SemanticScholarConnector {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        question: &str,
        _domain: &str,
        max_results: usize,
    ) -> ConnectorResult<Vec<RawCandidate>> {
        let limit = max_results.clamp(1, MAX_LIMIT).to_string();
        let url = url::Url::parse_with_params(
            &self.base_url,
            &[("query", question), ("limit", limit.as_str()), ("fields", FIELDS)],
        )
        .map_err(|e| ConnectorError::Parse {
            connector: NAME.to_string(),
            reason: e.to_string(),
        })?;

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key.expose());
        }

        let response = check_status(NAME, request.send().await.map_err(http_error)?)?;
        let body = response.text().await.map_err(http_error)?;

        let candidates = Self::parse(&body)?;
        debug!(connector = NAME, count = candidates.len(), "Search complete");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "total": 2,
            "data": [
                {
                    "paperId": "abc",
                    "title": "Coffee and Parkinson's disease",
                    "authors": [{"authorId": "1", "name": "A. Ross"}, {"authorId": null, "name": null}],
                    "year": 2001,
                    "venue": "JAMA",
                    "url": "https://www.semanticscholar.org/paper/abc",
                    "citationCount": 812,
                    "abstract": "Higher coffee intake was associated with lower risk."
                },
                {
                    "paperId": "def",
                    "title": "Untitled",
                    "authors": [],
                    "year": null,
                    "venue": "",
                    "url": null,
                    "citationCount": null,
                    "abstract": null
                }
            ]
        }"#;

        let candidates = SemanticScholarConnector::parse(body).unwrap();
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].title, "Coffee and Parkinson's disease");
        assert_eq!(candidates[0].authors, vec!["A. Ross"]);
        assert_eq!(candidates[0].year.as_deref(), Some("2001"));
        assert_eq!(candidates[0].citation_count, Some(812));

        assert_eq!(candidates[1].url, "https://www.semanticscholar.org/paper/def");
        assert!(candidates[1].venue.is_none());
        assert!(candidates[1].abstract_text.is_empty());
    }

    #[test]
    fn test_parse_missing_data_is_empty() {
        let candidates = SemanticScholarConnector::parse(r#"{"total": 0}"#).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        let err = SemanticScholarConnector::parse("<html>").unwrap_err();
        assert!(matches!(err, ConnectorError::Parse { .. }));
    }
}

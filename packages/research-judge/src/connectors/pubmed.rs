//! PubMed connector via NCBI E-utilities.
//!
//! Two requests per search: `esearch` for PMIDs, then `esummary` for their
//! metadata. Summaries carry no abstract, so evidence from this connector
//! is scored on its title alone.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::{check_status, http_error};
use crate::error::{ConnectorError, ConnectorResult};
use crate::security::SecretString;
use crate::traits::connector::{RawCandidate, SourceConnector};

const NAME: &str = "pubmed";
const BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// The only domain this connector serves.
pub const MEDICAL_DOMAIN: &str = "medical";

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    esearchresult: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ArticleSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<ArticleAuthor>,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    fulljournalname: String,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct ArticleAuthor {
    name: String,
}

/// Searches PubMed for biomedical literature.
pub struct PubMedConnector {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl PubMedConnector {
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

    /// NCBI key; raises the quota from 3 to 10 requests per second.
    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn parse_error(reason: impl ToString) -> ConnectorError {
        ConnectorError::Parse {
            connector: NAME.to_string(),
            reason: reason.to_string(),
        }
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> ConnectorResult<String> {
        let mut params = params.to_vec();
        params.push(("retmode", "json"));
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.expose()));
        }

        let url = url::Url::parse_with_params(&format!("{}/{}", self.base_url, endpoint), &params)
            .map_err(Self::parse_error)?;

        let response = check_status(NAME, self.client.get(url).send().await.map_err(http_error)?)?;
        response.text().await.map_err(http_error)
    }

    fn parse_ids(body: &str) -> ConnectorResult<Vec<String>> {
        let envelope: SearchEnvelope = serde_json::from_str(body).map_err(Self::parse_error)?;
        Ok(envelope.esearchresult.idlist)
    }

    /// Parse `esummary` output, keeping the order of `ids`.
    fn parse_summaries(body: &str, ids: &[String]) -> ConnectorResult<Vec<RawCandidate>> {
        let mut envelope: SummaryEnvelope =
            serde_json::from_str(body).map_err(Self::parse_error)?;

        let candidates = ids
            .iter()
            .filter_map(|id| {
                let value = envelope.result.remove(id)?;
                let summary: ArticleSummary = serde_json::from_value(value).ok()?;
                Some(Self::to_candidate(id, summary))
            })
            .collect();

        Ok(candidates)
    }

    fn to_candidate(id: &str, summary: ArticleSummary) -> RawCandidate {
        let venue = if !summary.fulljournalname.is_empty() {
            Some(summary.fulljournalname)
        } else if !summary.source.is_empty() {
            Some(summary.source)
        } else {
            None
        };

        RawCandidate {
            title: summary.title.trim_end_matches('.').to_string(),
            authors: summary.authors.into_iter().map(|a| a.name).collect(),
            year: summary
                .pubdate
                .split_whitespace()
                .next()
                .filter(|y| !y.is_empty())
                .map(str::to_string),
            venue,
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id),
            citation_count: None,
            abstract_text: String::new(),
        }
    }
}

impl Default for PubMedConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceConnector for PubMedConnector {
    fn name(&self) -> &str {
        NAME
    }

    fn applies_to(&self, domain: &str) -> bool {
        domain == MEDICAL_DOMAIN
    }

    async fn search(
        &self,
        question: &str,
        _domain: &str,
        max_results: usize,
    ) -> ConnectorResult<Vec<RawCandidate>> {
        let retmax = max_results.to_string();
        let body = self
            .get(
                "esearch.fcgi",
                &[("db", "pubmed"), ("term", question), ("retmax", retmax.as_str())],
            )
            .await?;
        let ids = Self::parse_ids(&body)?;

        if ids.is_empty() {
            debug!(connector = NAME, "No PMIDs matched");
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let body = self
            .get("esummary.fcgi", &[("db", "pubmed"), ("id", joined.as_str())])
            .await?;

        let candidates = Self::parse_summaries(&body, &ids)?;
        debug!(connector = NAME, count = candidates.len(), "Search complete");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let body = r#"{"header": {}, "esearchresult": {"count": "2", "idlist": ["111", "222"]}}"#;
        assert_eq!(PubMedConnector::parse_ids(body).unwrap(), vec!["111", "222"]);
    }

    #[test]
    fn test_parse_summaries_keeps_search_order() {
        let body = r#"{
            "header": {},
            "result": {
                "uids": ["222", "111"],
                "222": {
                    "uid": "222",
                    "title": "Caffeine intake and Parkinson's disease risk.",
                    "authors": [{"name": "Ross GW", "authtype": "Author"}],
                    "pubdate": "2000 May 24",
                    "fulljournalname": "JAMA",
                    "source": "JAMA"
                },
                "111": {
                    "uid": "111",
                    "title": "Coffee cohort",
                    "authors": [],
                    "pubdate": "",
                    "fulljournalname": "",
                    "source": "Neurology"
                }
            }
        }"#;

        let ids = vec!["111".to_string(), "222".to_string(), "333".to_string()];
        let candidates = PubMedConnector::parse_summaries(body, &ids).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Coffee cohort");
        assert_eq!(candidates[0].venue.as_deref(), Some("Neurology"));
        assert!(candidates[0].year.is_none());

        assert_eq!(candidates[1].title, "Caffeine intake and Parkinson's disease risk");
        assert_eq!(candidates[1].authors, vec!["Ross GW"]);
        assert_eq!(candidates[1].year.as_deref(), Some("2000"));
        assert_eq!(candidates[1].url, "https://pubmed.ncbi.nlm.nih.gov/222/");
    }

    #[test]
    fn test_medical_only() {
        let connector = PubMedConnector::new();
        assert!(connector.applies_to("medical"));
        assert!(!connector.applies_to("general"));
    }
}

//! arXiv preprint connector.
//!
//! The export API answers with an Atom feed. Only a handful of elements
//! are needed, so entries are picked apart with regexes instead of a full
//! XML parser.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::{check_status, http_error};
use crate::error::{ConnectorError, ConnectorResult};
use crate::traits::connector::{RawCandidate, SourceConnector};

const NAME: &str = "arxiv";
const BASE_URL: &str = "https://export.arxiv.org/api/query";

struct FeedPatterns {
    entry: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    id: Regex,
    author: Regex,
    journal_ref: Regex,
}

fn build_patterns() -> Option<FeedPatterns> {
    Some(FeedPatterns {
        entry: Regex::new(r"(?s)<entry>(.*?)</entry>").ok()?,
        title: Regex::new(r"(?s)<title[^>]*>(.*?)</title>").ok()?,
        summary: Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>").ok()?,
        published: Regex::new(r"<published>(\d{4})").ok()?,
        id: Regex::new(r"<id>\s*(.*?)\s*</id>").ok()?,
        author: Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").ok()?,
        journal_ref: Regex::new(r"(?s)<arxiv:journal_ref[^>]*>(.*?)</arxiv:journal_ref>").ok()?,
    })
}

fn patterns() -> Option<&'static FeedPatterns> {
    static PATTERNS: OnceLock<Option<FeedPatterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_patterns).as_ref()
}

/// Collapse whitespace and decode the XML entities arXiv emits.
fn clean(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Parse an Atom feed into candidates, in feed order.
pub fn parse_feed(feed: &str) -> ConnectorResult<Vec<RawCandidate>> {
    let parse_error = |reason: &str| ConnectorError::Parse {
        connector: NAME.to_string(),
        reason: reason.to_string(),
    };

    let p = patterns().ok_or_else(|| parse_error("feed patterns failed to compile"))?;
    if !feed.contains("<feed") {
        return Err(parse_error("response is not an Atom feed"));
    }

    let candidates = p
        .entry
        .captures_iter(feed)
        .filter_map(|c| c.get(1))
        .map(|entry| {
            let entry = entry.as_str();
            RawCandidate {
                title: capture(&p.title, entry).unwrap_or_default(),
                authors: p
                    .author
                    .captures_iter(entry)
                    .filter_map(|c| c.get(1))
                    .map(|m| clean(m.as_str()))
                    .collect(),
                year: capture(&p.published, entry),
                venue: capture(&p.journal_ref, entry).or_else(|| Some("arXiv".to_string())),
                url: capture(&p.id, entry).unwrap_or_default(),
                citation_count: None,
                abstract_text: capture(&p.summary, entry).unwrap_or_default(),
            }
        })
        .collect();

    Ok(candidates)
}

/// Searches the arXiv export API.
pub struct ArxivConnector {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for ArxivConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceConnector for ArxivConnector {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        question: &str,
        _domain: &str,
        max_results: usize,
    ) -> ConnectorResult<Vec<RawCandidate>> {
        let search_query = format!("all:{}", question);
        let max_results = max_results.to_string();
        let url = url::Url::parse_with_params(
            &self.base_url,
            &[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ],
        )
        .map_err(|e| ConnectorError::Parse {
            connector: NAME.to_string(),
            reason: e.to_string(),
        })?;

        let response = check_status(NAME, self.client.get(url).send().await.map_err(http_error)?)?;
        let feed = response.text().await.map_err(http_error)?;

        let candidates = parse_feed(&feed)?;
        debug!(connector = NAME, count = candidates.len(), "Search complete");
        Ok(candidates)
    }
}

//! Wikipedia lookup through the MediaWiki action API.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{truncate_chars, Tool, ToolError, ToolKind};
use crate::config::WikipediaConfig;

const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

/// Longest query MediaWiki search accepts.
const MAX_QUERY_CHARS: usize = 300;

pub struct WikipediaLookup {
    http: reqwest::Client,
    config: WikipediaConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: Option<serde_json::Value>,
}

impl WikipediaLookup {
    pub fn new(http: reqwest::Client, config: WikipediaConfig) -> Self {
        Self { http, config }
    }

    fn api_url(&self) -> String {
        format!("{}/w/api.php", self.config.base_url.trim_end_matches('/'))
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let limit = self.config.top_k.to_string();
        let response: SearchResponse = self
            .http
            .get(self.api_url())
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let hits = response
            .query
            .ok_or_else(|| ToolError::MalformedResponse("search response has no `query`".into()))?
            .search;
        Ok(hits
            .into_iter()
            .take(self.config.top_k)
            .map(|h| h.title)
            .collect())
    }

    /// Intro section of a page as plain text; `None` when the page is gone.
    /// Redirects are followed.
    async fn summary(&self, title: &str) -> Result<Option<String>, ToolError> {
        let response: ExtractResponse = self
            .http
            .get(self.api_url())
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", title),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let page = response
            .query
            .and_then(|q| q.pages.into_values().next())
            .filter(|p| p.missing.is_none());

        Ok(page.and_then(|p| {
            let extract = p.extract?.trim().to_string();
            (!extract.is_empty()).then_some(extract)
        }))
    }
}

#[async_trait]
impl Tool for WikipediaLookup {
    fn kind(&self) -> ToolKind {
        ToolKind::Lookup
    }

    fn description(&self) -> &str {
        "Searching from wikipedia about the queries"
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let query = truncate_chars(input.trim(), MAX_QUERY_CHARS);
        let titles = self.search_titles(&query).await?;

        let mut summaries = Vec::new();
        // Pages are labelled with the search hit, not the redirect target.
        for title in &titles {
            if let Some(extract) = self.summary(title).await? {
                summaries.push(format!("Page: {}\nSummary: {}", title, extract));
            }
        }

        tracing::debug!(
            query = %query,
            hits = titles.len(),
            pages = summaries.len(),
            "Wikipedia lookup"
        );

        if summaries.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }
        Ok(truncate_chars(&summaries.join("\n\n"), self.config.max_chars))
    }
}

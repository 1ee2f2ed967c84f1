//! Web search through the DuckDuckGo HTML endpoint (no API key needed).

use async_trait::async_trait;

use super::{Tool, ToolError, ToolKind};
use crate::config::SearchConfig;

const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

pub struct WebSearch {
    http: reqwest::Client,
    config: SearchConfig,
}

impl WebSearch {
    pub fn new(http: reqwest::Client, config: SearchConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    fn description(&self) -> &str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to answer questions about current events. Input should be a search query."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        let url = format!(
            "{}/html/?q={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );

        let html = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let snippets = extract_snippets(&html, self.config.max_results);
        tracing::debug!(query, results = snippets.len(), "DuckDuckGo search");

        if snippets.is_empty() {
            Ok(NO_RESULTS.to_string())
        } else {
            Ok(snippets.join(" "))
        }
    }
}

/// Pull result snippets out of the DuckDuckGo HTML page.
fn extract_snippets(html: &str, limit: usize) -> Vec<String> {
    html.split("result__body")
        .skip(1)
        .filter_map(|chunk| {
            let raw = chunk.split("class=\"result__snippet\"").nth(1)?;
            // The snippet element may contain <b> highlights, so read up to
            // its closing tag and strip inner markup.
            let inner = raw.split_once('>')?.1;
            let end = inner.find("</a>").or_else(|| inner.find("</div>"))?;
            let text = html_decode(&strip_tags(&inner[..end]));
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .take(limit)
        .collect()
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <div class="result results_links">
          <div class="links_main links_deep result__body">
            <h2 class="result__title"><a class="result__a" href="https://example.com/rust">Rust</a></h2>
            <a class="result__snippet" href="https://example.com/rust">A language empowering <b>everyone</b> to build reliable &amp; efficient software.</a>
          </div>
        </div>
        <div class="result results_links">
          <div class="links_main links_deep result__body">
            <h2 class="result__title"><a class="result__a" href="https://example.com/book">Book</a></h2>
            <a class="result__snippet" href="https://example.com/book">The Rust Programming Language book.</a>
          </div>
        </div>
        <div class="result results_links">
          <div class="links_main links_deep result__body">
            <h2 class="result__title"><a class="result__a" href="https://example.com/ad">Ad</a></h2>
          </div>
        </div>
    "#;

    #[test]
    fn extracts_decoded_snippets_in_order() {
        let snippets = extract_snippets(PAGE, 5);
        assert_eq!(
            snippets,
            vec![
                "A language empowering everyone to build reliable & efficient software.",
                "The Rust Programming Language book.",
            ]
        );
    }

    #[test]
    fn respects_result_limit() {
        assert_eq!(extract_snippets(PAGE, 1).len(), 1);
        assert!(extract_snippets("<html>nothing here</html>", 5).is_empty());
    }

    #[tokio::test]
    async fn queries_endpoint_and_joins_snippets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "rust language"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let tool = WebSearch::new(
            reqwest::Client::new(),
            SearchConfig {
                base_url: server.uri(),
                max_results: 5,
            },
        );
        let out = tool.execute("rust language").await.unwrap();
        assert!(out.starts_with("A language empowering everyone"));
        assert!(out.ends_with("The Rust Programming Language book."));
    }

    #[tokio::test]
    async fn empty_page_and_upstream_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "nothing"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "blocked"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tool = WebSearch::new(
            reqwest::Client::new(),
            SearchConfig {
                base_url: server.uri(),
                max_results: 5,
            },
        );
        assert_eq!(tool.execute("nothing").await.unwrap(), NO_RESULTS);
        assert!(matches!(
            tool.execute("blocked").await,
            Err(ToolError::UpstreamStatus(403))
        ));
    }
}

//! General web search through the DuckDuckGo HTML endpoint.

use async_trait::async_trait;

use super::{html_decode, Tool};

const MAX_RESULTS: usize = 5;

/// Search the web. Returns the joined result snippets, uncapped.
pub struct WebSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl WebSearch {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to answer questions about current events. Input should be a search query."
    }

    async fn invoke(&self, query: &str) -> anyhow::Result<String> {
        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("DuckDuckGo HTTP error: {}", status));
        }
        let html = response.text().await?;

        let snippets = extract_ddg_snippets(&html);
        tracing::debug!(query, results = snippets.len(), "DuckDuckGo search");

        if snippets.is_empty() {
            Ok("No good DuckDuckGo Search Result was found".to_string())
        } else {
            Ok(snippets.join(" "))
        }
    }
}

/// Extract result snippets from DuckDuckGo HTML.
fn extract_ddg_snippets(html: &str) -> Vec<String> {
    html.split("class=\"result__body\"")
        .skip(1)
        .filter_map(|chunk| {
            let after_class = chunk.split("class=\"result__snippet\"").nth(1)?;
            let (_, body) = after_class.split_once('>')?;
            let inner = body
                .split_once("</a>")
                .map(|(inner, _)| inner)
                .unwrap_or(body);
            let text = strip_tags(inner);
            (!text.is_empty()).then_some(text)
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Drop inline markup such as `<b>` and collapse whitespace.
fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;

    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    html_decode(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{client, MockUpstream};
    use axum::{extract::Query, response::Html, routing::get, Router};
    use std::collections::HashMap;

    fn result(snippet: &str) -> String {
        format!(
            r#"<div class="result__body"><a class="result__a" href="https://example.com">Title</a>
<a class="result__snippet" href="https://example.com">{}</a></div>"#,
            snippet
        )
    }

    #[test]
    fn extracts_snippets_without_markup() {
        let html = format!(
            "<html>{}{}</html>",
            result("<b>Rust</b> is a systems &amp; application language."),
            result("Second hit.")
        );
        assert_eq!(
            extract_ddg_snippets(&html),
            vec![
                "Rust is a systems & application language.".to_string(),
                "Second hit.".to_string()
            ]
        );
    }

    #[test]
    fn keeps_at_most_five_results() {
        let html: String = (0..8).map(|i| result(&format!("hit {}", i))).collect();
        assert_eq!(extract_ddg_snippets(&html).len(), MAX_RESULTS);
    }

    #[tokio::test]
    async fn joins_snippets_from_upstream() {
        let app = Router::new().route(
            "/html/",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let q = params.get("q").cloned().unwrap_or_default();
                Html(format!("{}{}", result(&format!("about {}", q)), result("more")))
            }),
        );
        let upstream = MockUpstream::start(app).await;
        let tool = WebSearch::new(client(), upstream.url("/html/"));

        let output = tool.invoke("rust lang").await.unwrap();
        assert_eq!(output, "about rust lang more");
    }

    #[tokio::test]
    async fn reports_when_nothing_matched() {
        let app = Router::new().route("/html/", get(|| async { Html("<html></html>") }));
        let upstream = MockUpstream::start(app).await;
        let tool = WebSearch::new(client(), upstream.url("/html/"));

        let output = tool.invoke("zzzz").await.unwrap();
        assert_eq!(output, "No good DuckDuckGo Search Result was found");
    }
}

//! Encyclopedia lookup through the MediaWiki action API.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{truncate_chars, Tool};

const MAX_QUERY_LENGTH: usize = 300;

/// Search Wikipedia and return the intro of the top pages, capped.
pub struct WikipediaSearch {
    client: reqwest::Client,
    endpoint: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
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
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

impl WikipediaSearch {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        top_k_results: usize,
        doc_content_chars_max: usize,
    ) -> Self {
        Self {
            client,
            endpoint,
            top_k_results,
            doc_content_chars_max,
        }
    }

    async fn search_titles(&self, query: &str) -> anyhow::Result<Vec<String>> {
        let limit = self.top_k_results.to_string();
        let response: SearchResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn page_summary(&self, title: &str) -> anyhow::Result<Option<String>> {
        let response: ExtractResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let page = response
            .query
            .and_then(|q| q.pages.into_values().find(|p| p.extract.is_some()));

        Ok(page.and_then(|p| {
            p.extract
                .map(|extract| format!("Page: {}\nSummary: {}", p.title, extract.trim()))
        }))
    }
}

#[async_trait]
impl Tool for WikipediaSearch {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer general questions about people, places, companies, facts, historical events, or other subjects. Input should be a search query."
    }

    async fn invoke(&self, query: &str) -> anyhow::Result<String> {
        let query = truncate_chars(query, MAX_QUERY_LENGTH);
        let titles = self.search_titles(&query).await?;

        let mut summaries = Vec::new();
        for title in titles.iter().take(self.top_k_results) {
            if let Some(summary) = self.page_summary(title).await? {
                summaries.push(summary);
            }
        }
        tracing::debug!(query = %query, pages = summaries.len(), "Wikipedia search");

        if summaries.is_empty() {
            return Ok("No good Wikipedia Search Result was found".to_string());
        }
        Ok(truncate_chars(
            &summaries.join("\n\n"),
            self.doc_content_chars_max,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{client, MockUpstream};
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::{json, Value};

    async fn fake_api(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        if params.get("list").map(String::as_str) == Some("search") {
            let hits = if params["srsearch"].contains("nothing") {
                json!([])
            } else {
                json!([{ "title": "Machine learning" }, { "title": "Deep learning" }])
            };
            return Json(json!({ "query": { "search": hits } }));
        }
        let title = params["titles"].clone();
        Json(json!({
            "query": { "pages": { "233488": {
                "title": title,
                "extract": "Machine learning (ML) is a field of study in artificial intelligence concerned with the development and study of statistical algorithms that can learn from data and generalize to unseen data, and thus perform tasks without explicit instructions."
            } } }
        }))
    }

    fn tool(upstream: &MockUpstream, chars_max: usize) -> WikipediaSearch {
        WikipediaSearch::new(client(), upstream.url("/w/api.php"), 1, chars_max)
    }

    #[tokio::test]
    async fn returns_first_page_capped_to_excerpt_length() {
        let upstream =
            MockUpstream::start(Router::new().route("/w/api.php", get(fake_api))).await;

        let output = tool(&upstream, 200).invoke("What is machine learning?").await.unwrap();
        assert!(output.starts_with("Page: Machine learning\nSummary: Machine learning (ML)"));
        assert!(!output.contains("Deep learning"));
        assert!(output.chars().count() <= 200);
    }

    #[tokio::test]
    async fn short_results_are_not_padded() {
        let upstream =
            MockUpstream::start(Router::new().route("/w/api.php", get(fake_api))).await;

        let output = tool(&upstream, 2000).invoke("machine learning").await.unwrap();
        assert!(output.ends_with("without explicit instructions."));
    }

    #[tokio::test]
    async fn reports_when_nothing_matched() {
        let upstream =
            MockUpstream::start(Router::new().route("/w/api.php", get(fake_api))).await;

        let output = tool(&upstream, 200).invoke("nothing at all").await.unwrap();
        assert_eq!(output, "No good Wikipedia Search Result was found");
    }

    #[tokio::test]
    async fn upstream_failure_is_an_error() {
        let app = Router::new().route(
            "/w/api.php",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "down") }),
        );
        let upstream = MockUpstream::start(app).await;

        assert!(tool(&upstream, 200).invoke("anything").await.is_err());
    }
}

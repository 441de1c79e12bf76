//! Preprint lookup through the arXiv Atom query API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{truncate_chars, Tool};

const MAX_QUERY_LENGTH: usize = 300;

/// Search arXiv and return metadata plus abstract of the top papers, capped.
pub struct ArxivSearch {
    client: reqwest::Client,
    endpoint: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

impl Entry {
    fn is_api_error(&self) -> bool {
        self.id.contains("/api/errors")
    }

    fn render(&self) -> String {
        let published = self.published.get(..10).unwrap_or(self.published.as_str());
        let authors = self
            .authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            published,
            collapse_whitespace(&self.title),
            authors,
            collapse_whitespace(&self.summary)
        )
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_feed(xml: &str) -> anyhow::Result<Vec<Entry>> {
    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| anyhow::anyhow!("Invalid arXiv response: {}", e))?;

    if let Some(error) = feed.entries.iter().find(|e| e.is_api_error()) {
        return Err(anyhow::anyhow!(
            "arXiv API error: {}",
            collapse_whitespace(&error.summary)
        ));
    }
    Ok(feed.entries)
}

impl ArxivSearch {
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
}

#[async_trait]
impl Tool for ArxivSearch {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "A wrapper around Arxiv.org. Useful for when you need to answer questions about Physics, Mathematics, Computer Science, Quantitative Biology, Quantitative Finance, Statistics, Electrical Engineering, and Economics from scientific articles on arxiv.org. Input should be a search query."
    }

    async fn invoke(&self, query: &str) -> anyhow::Result<String> {
        let query = truncate_chars(query, MAX_QUERY_LENGTH);
        let max_results = self.top_k_results.to_string();

        let xml = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let entries = match parse_feed(&xml) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(query = %query, "arXiv query rejected: {}", e);
                return Ok(format!("Arxiv exception: {}", e));
            }
        };
        tracing::debug!(query = %query, entries = entries.len(), "arXiv search");

        if entries.is_empty() {
            return Ok("No good Arxiv Result was found".to_string());
        }
        let docs = entries
            .iter()
            .take(self.top_k_results)
            .map(Entry::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(truncate_chars(&docs, self.doc_content_chars_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{client, MockUpstream};
    use axum::{routing::get, Router};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=all:attention</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-01-01T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All You
      Need</title>
    <summary>  The dominant sequence transduction models are based on complex recurrent or
convolutional neural networks in an encoder-decoder configuration. The best
performing models also connect the encoder and decoder through an attention
mechanism.</summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:zzzz</title>
  <id>http://arxiv.org/api/def</id>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;

    #[test]
    fn renders_entry_metadata() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 1);
        let rendered = entries[0].render();
        assert!(rendered.starts_with(
            "Published: 2017-06-12\nTitle: Attention Is All You Need\nAuthors: Ashish Vaswani, Noam Shazeer\nSummary: The dominant"
        ));
    }

    #[test]
    fn api_error_entries_become_errors() {
        let err = parse_feed(ERROR_FEED).unwrap_err();
        assert!(err.to_string().contains("incorrect id format"));
    }

    #[tokio::test]
    async fn output_is_capped_to_excerpt_length() {
        let upstream = MockUpstream::start(
            Router::new().route("/api/query", get(|| async { FEED })),
        )
        .await;
        let tool = ArxivSearch::new(client(), upstream.url("/api/query"), 1, 200);

        let output = tool.invoke("attention transformers").await.unwrap();
        assert!(output.starts_with("Published: 2017-06-12"));
        assert!(output.chars().count() <= 200);
    }

    #[tokio::test]
    async fn api_errors_are_reported_as_text() {
        let upstream = MockUpstream::start(
            Router::new().route("/api/query", get(|| async { ERROR_FEED })),
        )
        .await;
        let tool = ArxivSearch::new(client(), upstream.url("/api/query"), 1, 200);

        assert_eq!(
            tool.invoke("id:1234").await.unwrap(),
            "Arxiv exception: arXiv API error: incorrect id format for 1234"
        );
    }

    #[tokio::test]
    async fn reports_when_nothing_matched() {
        let upstream = MockUpstream::start(
            Router::new().route("/api/query", get(|| async { EMPTY_FEED })),
        )
        .await;
        let tool = ArxivSearch::new(client(), upstream.url("/api/query"), 1, 200);

        assert_eq!(
            tool.invoke("zzzz").await.unwrap(),
            "No good Arxiv Result was found"
        );
    }
}

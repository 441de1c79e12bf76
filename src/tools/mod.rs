//! Lookup tools the agent can call.
//!
//! Every tool maps one text query to one short text result. Tools are built
//! once at startup and hold no per-query state.

mod arxiv;
mod web;
mod wikipedia;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ToolsConfig;

pub use arxiv::ArxivSearch;
pub use web::WebSearch;
pub use wikipedia::WikipediaSearch;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; SearchChat/0.1)";

/// A registered capability the agent can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// One-line description shown to the model in the prompt.
    fn description(&self) -> &str;

    async fn invoke(&self, query: &str) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Ordered set of tools, dispatched by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The web, preprint and encyclopedia tools, sharing one HTTP client.
    pub fn with_search_tools(config: &ToolsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let mut registry = Self::new();
        registry.register(Arc::new(WebSearch::new(
            client.clone(),
            config.duckduckgo_url.clone(),
        )));
        registry.register(Arc::new(ArxivSearch::new(
            client.clone(),
            config.arxiv_api_url.clone(),
            config.top_k_results,
            config.doc_content_chars_max,
        )));
        registry.register(Arc::new(WikipediaSearch::new(
            client,
            config.wikipedia_api_url.clone(),
            config.top_k_results,
            config.doc_content_chars_max,
        )));
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Keep at most `max_chars` characters (not bytes) of `s`.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Basic HTML entity decoding.
pub(crate) fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Local HTTP server standing in for the upstream search APIs.

    use axum::Router;
    use tokio::net::TcpListener;

    pub struct MockUpstream {
        pub base: String,
        handle: tokio::task::JoinHandle<()>,
    }

    impl MockUpstream {
        pub async fn start(app: Router) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });
            Self {
                base: format!("http://{}", addr),
                handle,
            }
        }

        pub fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }
    }

    impl Drop for MockUpstream {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    pub fn client() -> reqwest::Client {
        reqwest::Client::builder().build().unwrap()
    }
}

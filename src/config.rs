//! Configuration management for search-chat.
//!
//! Configuration can be set via environment variables (a `.env` file is
//! loaded first when present):
//! - `GROQ_API_KEY` - Optional. Fallback credential when a turn supplies none.
//! - `DEFAULT_MODEL` - Optional. The LLM model to use. Defaults to `llama3-8b-8192`.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to Groq.
//! - `LLM_STREAMING` - Optional. Stream completions token by token. Defaults to `true`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `15`.
//! - `TOOL_TOP_K_RESULTS` - Optional. Hits kept by the capped tools. Defaults to `1`.
//! - `TOOL_DOC_CHARS_MAX` - Optional. Excerpt cap of the capped tools. Defaults to `200`.
//! - `WIKIPEDIA_API_URL`, `ARXIV_API_URL`, `DUCKDUCKGO_URL` - Optional endpoint overrides.

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
pub const DEFAULT_DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Search tool configuration.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Number of hits the encyclopedia and preprint tools keep
    pub top_k_results: usize,

    /// Maximum characters returned by the encyclopedia and preprint tools
    pub doc_content_chars_max: usize,

    /// MediaWiki action API endpoint
    pub wikipedia_api_url: String,

    /// arXiv Atom query endpoint
    pub arxiv_api_url: String,

    /// DuckDuckGo HTML search endpoint
    pub duckduckgo_url: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            top_k_results: 1,
            doc_content_chars_max: 200,
            wikipedia_api_url: DEFAULT_WIKIPEDIA_API_URL.to_string(),
            arxiv_api_url: DEFAULT_ARXIV_API_URL.to_string(),
            duckduckgo_url: DEFAULT_DUCKDUCKGO_URL.to_string(),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fallback Groq API key, used when a turn does not carry its own
    pub api_key: Option<String>,

    /// Default LLM model identifier
    pub default_model: String,

    /// OpenAI-compatible base URL of the hosted model
    pub llm_base_url: String,

    /// Request streamed completions
    pub streaming: bool,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Search tool configuration
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or boolean variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let llm_base_url =
            std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string());

        let streaming = std::env::var("LLM_STREAMING")
            .ok()
            .map(|v| {
                parse_bool(&v).map_err(|e| ConfigError::InvalidValue("LLM_STREAMING".to_string(), e))
            })
            .transpose()?
            .unwrap_or(true);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_env("PORT", 3000)?;
        let max_iterations = parse_env("MAX_ITERATIONS", 15)?;

        let defaults = ToolsConfig::default();
        let tools = ToolsConfig {
            top_k_results: parse_env("TOOL_TOP_K_RESULTS", defaults.top_k_results)?,
            doc_content_chars_max: parse_env("TOOL_DOC_CHARS_MAX", defaults.doc_content_chars_max)?,
            wikipedia_api_url: std::env::var("WIKIPEDIA_API_URL")
                .unwrap_or(defaults.wikipedia_api_url),
            arxiv_api_url: std::env::var("ARXIV_API_URL").unwrap_or(defaults.arxiv_api_url),
            duckduckgo_url: std::env::var("DUCKDUCKGO_URL").unwrap_or(defaults.duckduckgo_url),
        };

        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            default_model,
            llm_base_url,
            streaming,
            host,
            port,
            max_iterations,
            tools,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, default_model: String, llm_base_url: String) -> Self {
        Self {
            api_key,
            default_model,
            llm_base_url,
            streaming: false,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_iterations: 15,
            tools: ToolsConfig::default(),
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

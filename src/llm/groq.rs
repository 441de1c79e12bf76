//! Groq (OpenAI-compatible chat completions) client.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, CompletionRequest, LlmClient, LlmError, TokenSink};

/// Chat completions client bound to one credential.
///
/// Cheap to build: the underlying `reqwest::Client` and its connection pool
/// are shared, only the credential and model settings are per instance.
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_builder(&self, request: &CompletionRequest) -> reqwest::RequestBuilder {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            stop: (!request.stop.is_empty()).then_some(request.stop.as_slice()),
            temperature: request.temperature,
            stream: request.stream,
        };
        self.client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
    }

    async fn complete_blocking(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = self
            .request_builder(request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        on_token: TokenSink<'_>,
    ) -> Result<String, LlmError> {
        let mut source = self
            .request_builder(request)
            .eventsource()
            .map_err(|e| LlmError::unknown(format!("Failed to open event stream: {e}")))?;

        let result = read_stream(&mut source, on_token).await;
        source.close();
        result
    }
}

async fn read_stream(source: &mut EventSource, on_token: TokenSink<'_>) -> Result<String, LlmError> {
    let mut text = String::new();

    while let Some(event) = source.next().await {
        match event {
            Ok(Event::Open) => {}
            Ok(Event::Message(message)) => {
                if message.data.trim() == "[DONE]" {
                    break;
                }
                let chunk: StreamChunk = serde_json::from_str(&message.data).map_err(|e| {
                    LlmError::unknown(format!("Failed to parse stream chunk: {e}"))
                })?;
                for delta in chunk
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.delta.content)
                {
                    on_token(&delta);
                    text.push_str(&delta);
                }
            }
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::from_status(status, &body));
            }
            Err(reqwest_eventsource::Error::Transport(e)) => return Err(request_error(e)),
            Err(e) => return Err(LlmError::unknown(format!("Event stream failed: {e}"))),
        }
    }

    Ok(text)
}

fn request_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        LlmError::network(format!("Connection failed: {e}"))
    } else {
        LlmError::unknown(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        on_token: TokenSink<'_>,
    ) -> Result<String, LlmError> {
        tracing::debug!(
            model = %request.model,
            stream = request.stream,
            messages = request.messages.len(),
            "LLM completion request"
        );

        if request.stream {
            self.complete_streaming(request, on_token).await
        } else {
            self.complete_blocking(request).await
        }
    }
}

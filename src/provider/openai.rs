//! OpenAI chat completions client.
//!
//! Speaks the `/chat/completions` wire format for both the blocking and the
//! streaming (`stream: true`, server-sent events) variants. Any
//! OpenAI-compatible endpoint works by pointing `base_url` at it.

use std::future;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatMessage, CompletionProvider, FragmentStream, Prompt, ProviderError};
use crate::config::ProviderConfig;

/// Sentinel payload that ends an OpenAI event stream.
const DONE_SENTINEL: &str = "[DONE]";

/// HTTP client for one OpenAI-compatible endpoint and model.
///
/// Cheap to share: `reqwest::Client` is internally reference counted and the
/// remaining fields are read-only after construction.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

// ─── Wire Types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
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
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ─── Client ────────────────────────────────────────────────────────────────

impl OpenAiClient {
    /// Create a client for the configured endpoint, authenticating with `api_key`.
    pub fn new(api_key: impl Into<String>, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn body<'a>(&'a self, prompt: &'a Prompt, stream: bool) -> CompletionBody<'a> {
        CompletionBody {
            model: &self.model,
            messages: &prompt.messages,
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
            stream,
        }
    }

    /// POST the completion request and fail on any non-success status.
    async fn send(&self, prompt: &Prompt, stream: bool) -> Result<reqwest::Response, ProviderError> {
        debug!(
            model = self.model,
            messages = prompt.messages.len(),
            stream,
            "Sending completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.body(prompt, stream))
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let response = self.send(prompt, false).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        extract_reply(parsed)
    }

    async fn stream(&self, prompt: &Prompt) -> Result<FragmentStream, ProviderError> {
        let response = self.send(prompt, true).await?;

        let fragments = response
            .bytes_stream()
            .eventsource()
            .map(|event| match event {
                Ok(event) => Ok(event.data),
                Err(e) => Err(ProviderError::Stream(e.to_string())),
            })
            .take_while(|item| {
                future::ready(!matches!(item, Ok(data) if data.as_str() == DONE_SENTINEL))
            })
            .filter_map(|item| {
                future::ready(match item {
                    Ok(data) => parse_chunk(&data).transpose(),
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }
}

// ─── Decoding ──────────────────────────────────────────────────────────────

/// Pull the reply text out of a non-streaming response.
///
/// A `null` content (e.g. a refusal or an empty generation) is returned as an
/// empty reply; a response with no choices at all is malformed.
fn extract_reply(response: CompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ProviderError::Malformed("no choices in completion response".to_string()))
}

/// Decode one stream chunk payload into its text fragment, if any.
///
/// Role announcements, finish-reason chunks and empty deltas yield `None`.
fn parse_chunk(data: &str) -> Result<Option<String>, ProviderError> {
    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(ProviderError::Stream(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// Build the error for a non-success response, preferring the API's own message.
async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body,
    };

    warn!(status = status.as_u16(), error = %message, "Provider returned an error status");

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

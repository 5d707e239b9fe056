//! Completion provider abstraction.
//!
//! - [`openai`]: HTTP client for the OpenAI chat completions API
//!
//! The relay only needs two operations from a provider: a blocking
//! completion returning the full text, and a streaming completion returning
//! text fragments in emission order.

pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::OpenAiClient;

/// Failure raised by a completion provider.
///
/// Every variant displays the provider's original error text, so callers can
/// embed it unmodified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("{0}")]
    Http(String),

    /// Non-success status returned by the API.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Response or chunk that could not be decoded.
    #[error("{0}")]
    Malformed(String),

    /// Failure while reading the event stream.
    #[error("{0}")]
    Stream(String),
}

/// Sequence of text fragments from a streaming completion.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged prompt message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A complete completion request: ordered messages plus sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// An external completion service.
///
/// Implementations must be stateless from the caller's side: the relay shares
/// one instance across all concurrently handled requests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run a non-streaming completion and return the generated text.
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError>;

    /// Start a streaming completion. The returned stream yields fragments in
    /// the order the provider emits them and ends at the provider's
    /// end-of-stream signal.
    async fn stream(&self, prompt: &Prompt) -> Result<FragmentStream, ProviderError>;
}

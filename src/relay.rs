//! The relay service: prompt construction and the two chat operations.
//!
//! Both operations check for a configured provider before doing anything else.
//! A missing provider means no credential was available at startup.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::RelayError;
use crate::provider::{ChatMessage, CompletionProvider, Prompt};
use crate::server::streaming::{relay_events, StreamEvent};

/// Forwards user messages to the completion provider with a fixed persona.
#[derive(Clone)]
pub struct Relay {
    provider: Option<Arc<dyn CompletionProvider>>,
    generation: GenerationConfig,
}

impl Relay {
    /// Create a relay. `provider` is `None` when no credential is configured.
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, generation: GenerationConfig) -> Self {
        Self {
            provider,
            generation,
        }
    }

    /// Whether a provider credential was configured.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Build the two-message prompt: system instruction, then the user's message.
    pub fn prompt(&self, message: &str) -> Prompt {
        Prompt {
            messages: vec![
                ChatMessage::system(self.generation.system_prompt.as_str()),
                ChatMessage::user(message),
            ],
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
        }
    }

    fn provider(&self) -> Result<Arc<dyn CompletionProvider>, RelayError> {
        self.provider.clone().ok_or(RelayError::Configuration)
    }

    /// Run one blocking completion and return the provider's text verbatim.
    pub async fn chat(&self, message: &str) -> Result<String, RelayError> {
        let provider = self.provider()?;
        let prompt = self.prompt(message);

        let reply = provider.complete(&prompt).await?;

        debug!(reply_len = reply.len(), "Completion finished");
        Ok(reply)
    }

    /// Start a streaming completion.
    ///
    /// The credential check happens eagerly so the caller can reject the
    /// request before opening a response channel. Everything after that,
    /// including a failure to start the upstream request, is reported as a
    /// terminal [`StreamEvent::Error`] inside the returned stream.
    pub fn chat_stream(
        &self,
        message: &str,
    ) -> Result<impl Stream<Item = StreamEvent> + Send + 'static, RelayError> {
        let provider = self.provider()?;
        let prompt = self.prompt(message);

        Ok(async_stream::stream! {
            let fragments = match provider.stream(&prompt).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    debug!(error = %e, "Streaming completion failed to start");
                    yield StreamEvent::error(e.to_string());
                    return;
                }
            };

            let mut events = Box::pin(relay_events(fragments));
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[test]
    fn test_prompt_shape() {
        let relay = Relay::new(None, GenerationConfig::default());
        let prompt = relay.prompt("I feel stuck today");

        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert_eq!(
            prompt.messages[0].content,
            "You are a supportive mental coach. Keep responses concise and helpful (2-4 sentences)."
        );
        assert_eq!(prompt.messages[1].role, Role::User);
        assert_eq!(prompt.messages[1].content, "I feel stuck today");
        assert_eq!(prompt.max_tokens, 300);
        assert_eq!(prompt.temperature, 0.7);
    }

    #[tokio::test]
    async fn test_unconfigured_relay_rejects() {
        let relay = Relay::new(None, GenerationConfig::default());
        assert!(!relay.is_configured());
        assert!(matches!(relay.chat("hi").await, Err(RelayError::Configuration)));
        assert!(matches!(relay.chat_stream("hi"), Err(RelayError::Configuration)));
    }
}

//! SSE (Server-Sent Events) streaming for token-by-token responses.
//!
//! Two one-directional stages:
//! - [`relay_events`] turns a provider fragment stream into [`StreamEvent`]s
//! - [`sse_response`] frames each event as `data: {json}\n\n`
//!
//! Neither stage touches the network, so the whole transform is testable with
//! an in-memory fragment stream.

use std::convert::Infallible;

use axum::response::sse::{Event, Sse};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

/// One event on the streaming chat channel.
///
/// Serialized without a tag: `{"token": ".."}`, `{"done": true}` or
/// `{"error": ".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// One non-empty text fragment.
    Token { token: String },
    /// Terminal success marker. Always `true` on the wire.
    Done { done: bool },
    /// Terminal failure marker carrying the provider's error text.
    Error { error: String },
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        StreamEvent::Token { token: text.into() }
    }

    pub fn done() -> Self {
        StreamEvent::Done { done: true }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StreamEvent::Error { error: text.into() }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Token { .. })
    }
}

/// Map provider fragments to stream events.
///
/// Every non-empty fragment becomes a `Token` in arrival order. The stream
/// ends with exactly one terminal event: `Done` after the provider's end of
/// stream, or `Error` at the first failure. Nothing is read from `fragments`
/// after a failure.
pub fn relay_events<S>(fragments: S) -> impl Stream<Item = StreamEvent> + Send + 'static
where
    S: Stream<Item = Result<String, ProviderError>> + Send + 'static,
{
    async_stream::stream! {
        let mut fragments = Box::pin(fragments);

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) if text.is_empty() => continue,
                Ok(text) => {
                    yield StreamEvent::token(text);
                }
                Err(e) => {
                    yield StreamEvent::error(e.to_string());
                    return;
                }
            }
        }

        yield StreamEvent::done();
    }
}

/// Encode one event as an SSE frame.
pub fn to_sse_event(event: &StreamEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().data(data)
}

/// Wrap an event stream in an SSE response (`text/event-stream`, `no-cache`).
pub fn sse_response<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    Sse::new(events.map(|event| Ok(to_sse_event(&event))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(fragments: Vec<Result<&'static str, ProviderError>>) -> Vec<StreamEvent> {
        let fragments = stream::iter(
            fragments
                .into_iter()
                .map(|f| f.map(str::to_string))
                .collect::<Vec<_>>(),
        );
        relay_events(fragments).collect().await
    }

    #[tokio::test]
    async fn test_tokens_then_done() {
        let events = collect(vec![Ok("Hi"), Ok(" there"), Ok("!")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::token("Hi"),
                StreamEvent::token(" there"),
                StreamEvent::token("!"),
                StreamEvent::done(),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_after_token_ends_stream() {
        let events = collect(vec![
            Ok("Start"),
            Err(ProviderError::Stream("connection reset".to_string())),
            Ok("never sent"),
        ])
        .await;

        assert_eq!(
            events,
            vec![StreamEvent::token("Start"), StreamEvent::error("connection reset")]
        );
        assert!(!events.contains(&StreamEvent::done()));
    }

    #[tokio::test]
    async fn test_empty_fragments_skipped() {
        let events = collect(vec![Ok(""), Ok("a"), Ok(""), Ok("b")]).await;
        assert_eq!(
            events,
            vec![StreamEvent::token("a"), StreamEvent::token("b"), StreamEvent::done()]
        );
    }

    #[tokio::test]
    async fn test_empty_stream_is_just_done() {
        let events = collect(vec![]).await;
        assert_eq!(events, vec![StreamEvent::done()]);
    }

    #[test]
    fn test_event_json() {
        assert_eq!(
            serde_json::to_string(&StreamEvent::token("Hi")).unwrap(),
            r#"{"token":"Hi"}"#
        );
        assert_eq!(serde_json::to_string(&StreamEvent::done()).unwrap(), r#"{"done":true}"#);
        assert_eq!(
            serde_json::to_string(&StreamEvent::error("boom")).unwrap(),
            r#"{"error":"boom"}"#
        );
    }

    #[test]
    fn test_terminal_events() {
        assert!(!StreamEvent::token("x").is_terminal());
        assert!(StreamEvent::done().is_terminal());
        assert!(StreamEvent::error("x").is_terminal());
    }
}

//! coach-relay: minimal chat relay to the OpenAI completions API.
//!
//! Accepts a short message over HTTP, prepends a fixed coaching system prompt,
//! and returns the model's reply either in one JSON body or as a
//! server-sent-event token stream.

pub mod config;
pub mod error;
pub mod provider;
pub mod relay;
pub mod server;

pub use error::RelayError;
pub use provider::{CompletionProvider, FragmentStream, Prompt, ProviderError};
pub use relay::Relay;
pub use server::api::{build_router, AppState};

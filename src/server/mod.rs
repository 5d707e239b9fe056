//! HTTP server for the chat relay.
//!
//! - [`api`]: Request/response types and route handlers
//! - [`streaming`]: SSE streaming for token-by-token responses

pub mod api;
pub mod streaming;

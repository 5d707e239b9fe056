//! HTTP API of the relay.
//!
//! - GET /                  health check
//! - POST /api/chat         blocking chat completion
//! - POST /api/chat/stream  SSE token stream

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RelayError;
use crate::relay::Relay;
use crate::server::streaming::{sse_response, StreamEvent};

/// Application state shared across handlers.
pub struct AppState {
    pub relay: Relay,
}

/// Build the axum router with all API routes.
///
/// CORS is fully permissive so any frontend origin can call the relay.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Incoming chat message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply from the blocking chat endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, RelayError> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = request_id,
        message_len = req.message.len(),
        "Chat request"
    );

    let reply = state.relay.chat(&req.message).await.map_err(|e| {
        warn!(request_id = request_id, error = %e, "Chat request failed");
        e
    })?;

    info!(request_id = request_id, reply_len = reply.len(), "Chat reply sent");

    Ok(Json(ChatReply { reply }))
}

async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = request_id,
        message_len = req.message.len(),
        "Streaming chat request"
    );

    let events = state.relay.chat_stream(&req.message).map_err(|e| {
        warn!(request_id = request_id, error = %e, "Streaming chat rejected");
        e
    })?;

    let mut tokens = 0usize;
    let events = events.inspect(move |event| match event {
        StreamEvent::Token { .. } => tokens += 1,
        StreamEvent::Done { .. } => {
            info!(request_id = request_id, tokens, "Stream completed");
        }
        StreamEvent::Error { error } => {
            warn!(request_id = request_id, tokens, error = %error, "Stream failed");
        }
    });

    Ok(sse_response(events))
}

//! Relay error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No provider credential was available at startup.
    #[error("OPENAI_API_KEY not configured")]
    Configuration,

    #[error("Error calling OpenAI API: {0}")]
    Provider(#[from] ProviderError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

//! Error mapping for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chama_calls::CallError;
use chama_types::ValidationError;
use thiserror::Error;

/// Shown when a form submission fails validation.
pub const INVALID_FIELDS_NOTICE: &str = "Campos inválidos.";

/// Shown when a store write or read fails.
pub const STORE_NOTICE: &str = "Erro ao se comunicar com o banco de dados.";

/// API error type mapping to HTTP status codes.
///
/// Every body is JSON with an `error` message suitable for the panel.
/// Validation errors also name the offending field.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("not found: {0}")]
    NotFound(String),
    /// A store failure. The cause has already been logged; the client only
    /// gets the notice.
    #[error("{0}")]
    Store(&'static str),
}

impl ApiError {
    /// Logs a store failure and hides its details behind `notice`.
    pub fn store(notice: &'static str, err: CallError) -> Self {
        match err {
            CallError::NotFound(id) => ApiError::NotFound(format!("call {id}")),
            other => {
                tracing::error!(error = %other, "call store operation failed");
                ApiError::Store(notice)
            }
        }
    }
}

impl From<CallError> for ApiError {
    fn from(err: CallError) -> Self {
        ApiError::store(STORE_NOTICE, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": INVALID_FIELDS_NOTICE,
                    "field": e.field(),
                    "message": e.to_string(),
                }),
            ),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::Store(notice) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": notice }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

//! Error taxonomy for the signal engine and its HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Domain errors of the signal engine.
///
/// `NoData` and `Fetch` are per-symbol failures surfaced inside batch
/// results; `CalendarLookup` degrades to all-false flags; store errors
/// degrade to cache misses (reads) or are logged and dropped (writes).
/// None of these ever aborts a running batch.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("no price data available for {symbol}")]
    NoData { symbol: String },

    #[error("failed to fetch price history for {symbol}: {message}")]
    Fetch { symbol: String, message: String },

    #[error("calendar lookup failed for {symbol}: {message}")]
    CalendarLookup { symbol: String, message: String },

    #[error("store read failed: {0}")]
    StoreRead(String),

    #[error("store write failed: {0}")]
    StoreWrite(String),
}

impl SignalError {
    /// Transient fetch failures are the only retryable variant.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SignalError::Fetch { .. })
    }
}

/// HTTP-facing error for the API layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

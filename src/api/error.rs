//! HTTP error responses for the reading store API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::error::PotError;

/// Every failure the API reports, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Body missing, not `application/json`, or malformed.
    NotJson,
    /// JSON body without an integer `value`.
    InvalidValue,
    /// The store holds no readings yet.
    NoData,
    /// Storage layer failure.
    Storage(PotError),
    /// The blocking storage task itself failed.
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotJson | Self::InvalidValue => StatusCode::BAD_REQUEST,
            Self::NoData => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NotJson => "Request must be JSON".to_string(),
            Self::InvalidValue => "Missing or invalid 'value' key".to_string(),
            Self::NoData => "No data available".to_string(),
            Self::Storage(PotError::Store(e)) => format!("Database error: {e}"),
            Self::Storage(e) => format!("Database error: {e}"),
            Self::Internal(reason) => format!("Internal error: {reason}"),
        }
    }
}

impl From<PotError> for ApiError {
    fn from(err: PotError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

//! Route handlers: append a reading, fetch the latest reading.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::error::ApiError;
use crate::error::Result;
use crate::store::{LoggedReading, Reading, ReadingStore};

/// Body of a successful `POST /api/readings`.
#[derive(Debug, Serialize)]
pub struct AppendResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub logged_data: LoggedReading,
}

/// `POST /api/readings` with `{"value": <integer>}`.
///
/// The timestamp is always assigned here; any other fields in the body
/// are ignored.
pub async fn add_reading(
    State(store): State<ReadingStore>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<AppendResponse>), ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        debug!(%rejection, "Rejected non-JSON body");
        ApiError::NotJson
    })?;
    let value = integer_value(&body).ok_or(ApiError::InvalidValue)?;

    let logged = run_blocking(move || store.append(value)).await?;
    info!(timestamp = %logged.timestamp, pot_value = logged.pot_value, "Reading logged");

    Ok((
        StatusCode::CREATED,
        Json(AppendResponse {
            status: "success",
            message: "Data logged",
            logged_data: logged,
        }),
    ))
}

/// `GET /api/readings/latest`.
pub async fn latest_reading(
    State(store): State<ReadingStore>,
) -> std::result::Result<Json<Reading>, ApiError> {
    let reading = run_blocking(move || store.latest())
        .await?
        .ok_or(ApiError::NoData)?;
    Ok(Json(reading))
}

/// The `value` field of a JSON object, if it is an integer that fits i64.
///
/// Strings, floats (even `12.0`), booleans and null are not integers.
pub fn integer_value(body: &Value) -> Option<i64> {
    body.as_object()?.get("value")?.as_i64()
}

/// Run a storage call off the async executor.
async fn run_blocking<T, F>(f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

//! Row types and timestamp format for the `readings` table.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// DDL for the single readings table.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    pot_value INTEGER NOT NULL
);
";

/// ISO-8601 without an offset suffix, fixed-width so that string order is
/// chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A persisted reading, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub timestamp: String,
    pub pot_value: i64,
}

/// What an append wrote, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedReading {
    pub timestamp: String,
    pub pot_value: i64,
}

/// Current UTC time in the stored timestamp format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now().naive_utc())
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

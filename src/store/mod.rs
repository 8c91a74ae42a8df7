//! Persistent reading store.
//!
//! A single SQLite table of immutable readings:
//!
//! ```text
//! readings
//! ├── id         INTEGER PRIMARY KEY AUTOINCREMENT
//! ├── timestamp  TEXT NOT NULL     -- 2025-03-09T07:05:01.123456 (UTC, no offset)
//! └── pot_value  INTEGER NOT NULL
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use potlog::store::ReadingStore;
//!
//! // One-off preparation step; wipes any previous data
//! ReadingStore::initialize("readings.db")?;
//!
//! let store = ReadingStore::new("readings.db");
//! store.append(512)?;
//! if let Some(reading) = store.latest()? {
//!     println!("{} {}", reading.timestamp, reading.pot_value);
//! }
//! ```

mod db;
mod schema;

pub use db::{InitOutcome, ReadingStore};
pub use schema::{
    format_timestamp, now_timestamp, LoggedReading, Reading, SCHEMA_SQL, TIMESTAMP_FORMAT,
};

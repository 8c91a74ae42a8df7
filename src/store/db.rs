//! SQLite operations for the reading store.
//!
//! Every operation opens its own connection and closes it before
//! returning, so no handle is shared between API requests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, instrument};

use super::schema::{now_timestamp, LoggedReading, Reading, SCHEMA_SQL};
use crate::error::{PotError, Result};

/// How long a writer waits for SQLite's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of (re)creating the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub path: PathBuf,
    /// An older store file was deleted first.
    pub removed_existing: bool,
}

/// Handle to the on-disk reading store.
///
/// Holds only the path; cloning is cheap and clones share nothing else.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    path: PathBuf,
}

impl ReadingStore {
    /// Create a handle. The file is not touched until an operation runs.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Destroy any existing store at `path` and create an empty one.
    ///
    /// All previous readings are discarded.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn initialize<P: AsRef<Path>>(path: P) -> Result<InitOutcome> {
        let path = path.as_ref();

        let removed_existing = match std::fs::remove_file(path) {
            Ok(()) => {
                info!("Removed old database file");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(PotError::Io(e)),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PotError::Other(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);

        info!("Database and 'readings' table created");
        Ok(InitOutcome {
            path: path.to_path_buf(),
            removed_existing,
        })
    }

    /// Check that the store file exists.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(PotError::StoreMissing {
                path: self.path.display().to_string(),
            })
        }
    }

    /// Open a connection to an existing store; never creates the file.
    fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Append a reading stamped with the current UTC time.
    #[instrument(skip(self))]
    pub fn append(&self, pot_value: i64) -> Result<LoggedReading> {
        let timestamp = now_timestamp();
        self.insert_reading(&timestamp, pot_value)?;
        Ok(LoggedReading {
            timestamp,
            pot_value,
        })
    }

    /// Insert a reading with an explicit timestamp string.
    ///
    /// The HTTP API always goes through [`append`](Self::append); this is
    /// for replaying data and for tests that need controlled timestamps.
    #[instrument(skip(self))]
    pub fn insert_reading(&self, timestamp: &str, pot_value: i64) -> Result<i64> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO readings (timestamp, pot_value) VALUES (?1, ?2)",
            params![timestamp, pot_value],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, timestamp, pot_value, "Reading inserted");
        Ok(id)
    }

    /// The reading with the greatest timestamp; the later insert wins a tie.
    #[instrument(skip(self))]
    pub fn latest(&self) -> Result<Option<Reading>> {
        let conn = self.open()?;
        let reading = conn
            .query_row(
                "SELECT id, timestamp, pot_value FROM readings
                 ORDER BY timestamp DESC, id DESC LIMIT 1",
                [],
                |row| {
                    Ok(Reading {
                        id: row.get(0)?,
                        timestamp: row.get(1)?,
                        pot_value: row.get(2)?,
                    })
                },
            )
            .optional()?;

        debug!(found = reading.is_some(), "Latest reading fetched");
        Ok(reading)
    }

    /// Number of stored readings.
    #[instrument(skip(self))]
    pub fn count(&self) -> Result<u64> {
        let conn = self.open()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{IngestError, IngestResult};
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "0.3.0";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn open_database(path: &Path) -> IngestResult<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            IngestError::StorageUnavailable(format!(
                "failed to create directory {}: {err}",
                parent.display()
            ))
        })?;
    }

    let connection = Connection::open(path).map_err(|err| {
        IngestError::StorageUnavailable(format!("failed to open {}: {err}", path.display()))
    })?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    debug!(path = %path.display(), "database ready");
    Ok(connection)
}

pub fn configure_connection(connection: &Connection) -> IngestResult<()> {
    let configure = || -> rusqlite::Result<()> {
        connection.pragma_update(None, "journal_mode", "WAL")?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    };

    configure().map_err(|err| {
        IngestError::StorageUnavailable(format!("failed to configure connection: {err}"))
    })
}

pub fn ensure_schema(connection: &Connection) -> IngestResult<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS run (
              run_id INTEGER PRIMARY KEY AUTOINCREMENT,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL,
              year INTEGER NOT NULL,
              month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
              status TEXT NOT NULL DEFAULT 'Initialised',
              commentary TEXT,
              UNIQUE (year, month)
            );

            CREATE TABLE IF NOT EXISTS source (
              source_id INTEGER PRIMARY KEY AUTOINCREMENT,
              alias TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS term (
              term_id INTEGER PRIMARY KEY AUTOINCREMENT,
              term TEXT NOT NULL CHECK (length(term) > 0),
              frequency INTEGER NOT NULL CHECK (frequency >= 0),
              source_id INTEGER NOT NULL,
              run_id INTEGER NOT NULL,
              UNIQUE (term, source_id, run_id),
              FOREIGN KEY(source_id) REFERENCES source(source_id),
              FOREIGN KEY(run_id) REFERENCES run(run_id)
            );

            CREATE INDEX IF NOT EXISTS idx_term_run_source ON term(run_id, source_id);
            CREATE INDEX IF NOT EXISTS idx_run_status ON run(status);
            ",
        )
        .map_err(|err| {
            IngestError::StorageUnavailable(format!("failed to initialize schema: {err}"))
        })?;

    let now = now_utc_string();
    let record_metadata = || -> rusqlite::Result<()> {
        connection.execute(
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [DB_SCHEMA_VERSION],
        )?;
        connection.execute(
            "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [now.as_str()],
        )?;
        Ok(())
    };

    record_metadata().map_err(|err| {
        IngestError::StorageUnavailable(format!("failed to record schema metadata: {err}"))
    })
}

pub fn schema_version(connection: &Connection) -> IngestResult<Option<String>> {
    let version = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

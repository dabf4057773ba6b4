use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::error::{IngestError, IngestResult};
use crate::model::SourceRecord;

pub fn resolve_source(connection: &Connection, alias: &str) -> IngestResult<i64> {
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(IngestError::InvalidSource(
            "alias is empty".to_string(),
        ));
    }

    let inserted = connection.execute(
        "INSERT INTO source(alias) VALUES(?1) ON CONFLICT(alias) DO NOTHING",
        params![alias],
    )?;

    let source_id: i64 = connection.query_row(
        "SELECT source_id FROM source WHERE alias = ?1",
        params![alias],
        |row| row.get(0),
    )?;

    if inserted == 1 {
        info!(source_id, alias, "registered source");
    } else {
        debug!(source_id, alias, "resolved existing source");
    }

    Ok(source_id)
}

pub fn list_sources(connection: &Connection) -> IngestResult<Vec<SourceRecord>> {
    let mut statement = connection.prepare("SELECT source_id, alias FROM source ORDER BY source_id")?;
    let sources = statement
        .query_map([], |row| {
            Ok(SourceRecord {
                source_id: row.get(0)?,
                alias: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sources)
}

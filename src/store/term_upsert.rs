use rusqlite::{Connection, params};

use crate::error::IngestResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Skipped,
}

// An existing (term, source, run) row is never overwritten; a revised frequency is dropped.
pub fn upsert_term(
    connection: &Connection,
    term: &str,
    frequency: i64,
    source_id: i64,
    run_id: i64,
) -> IngestResult<UpsertOutcome> {
    let mut statement = connection.prepare_cached(
        "
        INSERT INTO term(term, frequency, source_id, run_id)
        VALUES(?1, ?2, ?3, ?4)
        ON CONFLICT(term, source_id, run_id) DO NOTHING
        ",
    )?;

    let changed = statement.execute(params![term, frequency, source_id, run_id])?;
    if changed == 0 {
        Ok(UpsertOutcome::Skipped)
    } else {
        Ok(UpsertOutcome::Inserted)
    }
}

pub fn count_terms(
    connection: &Connection,
    run_id: Option<i64>,
    source_id: Option<i64>,
) -> IngestResult<i64> {
    let count = connection.query_row(
        "
        SELECT COUNT(*) FROM term
        WHERE (?1 IS NULL OR run_id = ?1)
          AND (?2 IS NULL OR source_id = ?2)
        ",
        params![run_id, source_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

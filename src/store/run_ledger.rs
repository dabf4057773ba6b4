use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::model::{Period, RunRecord, RunStatus};
use crate::util::now_utc_string;

const RUN_COLUMNS: &str = "run_id, created_at, updated_at, year, month, status, commentary";

// A `Success` run is returned untouched; any other existing run is re-armed to `In Progress`.
pub fn open_run(
    connection: &Connection,
    period: Period,
    commentary: Option<&str>,
) -> IngestResult<(i64, RunStatus)> {
    let now = now_utc_string();
    let inserted = connection.execute(
        "
        INSERT INTO run(created_at, updated_at, year, month, status, commentary)
        VALUES(?1, ?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(year, month) DO NOTHING
        ",
        params![
            now,
            period.year,
            period.month,
            RunStatus::InProgress.as_str(),
            commentary
        ],
    )?;

    let (run_id, status): (i64, String) = connection.query_row(
        "SELECT run_id, status FROM run WHERE year = ?1 AND month = ?2",
        params![period.year, period.month],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let status = status.parse::<RunStatus>()?;

    if inserted == 1 {
        info!(run_id, period = %period, "created run");
        return Ok((run_id, RunStatus::InProgress));
    }

    if status == RunStatus::Success {
        info!(run_id, period = %period, "run already completed");
        return Ok((run_id, status));
    }

    warn!(run_id, period = %period, previous_status = %status, "re-opening existing run");
    connection.execute(
        "UPDATE run SET status = ?1, commentary = ?2, updated_at = ?3 WHERE run_id = ?4",
        params![RunStatus::InProgress.as_str(), commentary, now, run_id],
    )?;

    Ok((run_id, RunStatus::InProgress))
}

pub fn close_run(
    connection: &Connection,
    run_id: i64,
    status: RunStatus,
    commentary: Option<&str>,
) -> IngestResult<()> {
    if !status.is_terminal() {
        return Err(IngestError::InvalidTransition(status.to_string()));
    }

    let updated = connection.execute(
        "UPDATE run SET status = ?1, commentary = ?2, updated_at = ?3 WHERE run_id = ?4",
        params![status.as_str(), commentary, now_utc_string(), run_id],
    )?;
    if updated == 0 {
        return Err(IngestError::RunNotFound(run_id));
    }

    info!(run_id, status = %status, "closed run");
    Ok(())
}

pub fn find_run(connection: &Connection, period: Period) -> IngestResult<Option<RunRecord>> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM run WHERE year = ?1 AND month = ?2");
    let run = connection
        .query_row(&sql, params![period.year, period.month], run_from_row)
        .optional()?;
    Ok(run)
}

pub fn get_run(connection: &Connection, run_id: i64) -> IngestResult<RunRecord> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM run WHERE run_id = ?1");
    connection
        .query_row(&sql, [run_id], run_from_row)
        .optional()?
        .ok_or(IngestError::RunNotFound(run_id))
}

pub fn list_runs(connection: &Connection, limit: usize) -> IngestResult<Vec<RunRecord>> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM run ORDER BY run_id DESC LIMIT ?1");
    let mut statement = connection.prepare(&sql)?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let runs = statement
        .query_map([limit], run_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(runs)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(5)?;
    let status = status
        .parse::<RunStatus>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(err)))?;

    Ok(RunRecord {
        run_id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        period: Period {
            year: row.get(3)?,
            month: row.get(4)?,
        },
        status,
        commentary: row.get(6)?,
    })
}

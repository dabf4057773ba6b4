use rusqlite::Connection;
use tracing::{error, info, info_span, warn};

use crate::error::{IngestError, IngestResult};
use crate::model::{BatchOutcome, Period, RunStatus, SourceCounts, TermDataset};
use crate::util::now_utc_string;

use super::run_ledger::{close_run, get_run, open_run};
use super::source_registry::resolve_source;
use super::term_upsert::{UpsertOutcome, upsert_term};

// The run is closed exactly once. `Err` means the run could not be opened or closed.
pub fn insert_batch(
    connection: &mut Connection,
    period: Period,
    commentary: Option<&str>,
    sources: &[(String, TermDataset)],
) -> IngestResult<BatchOutcome> {
    let span = info_span!("batch", year = period.year, month = period.month);
    let _entered = span.enter();

    let (run_id, status) = open_run(connection, period, commentary)?;
    if status == RunStatus::Success {
        let run = get_run(connection, run_id)?;
        info!(run_id, "period already ingested, skipping batch");
        return Ok(BatchOutcome {
            run_id,
            period,
            status,
            commentary: run.commentary,
            skipped: true,
            sources: Vec::new(),
            completed_at: now_utc_string(),
        });
    }

    info!(run_id, sources = sources.len(), "ingesting batch");

    let (status, final_commentary, counts) =
        match ingest_sources(connection, run_id, period, sources) {
            Ok(counts) => {
                let inserted: usize = counts.iter().map(|source| source.inserted).sum();
                info!(run_id, inserted, "batch committed");
                (
                    RunStatus::Success,
                    commentary.map(ToOwned::to_owned),
                    counts,
                )
            }
            Err(err) => {
                error!(run_id, error = %err, "batch rolled back");
                (RunStatus::Fatal, Some(err.to_string()), Vec::new())
            }
        };

    close_run(connection, run_id, status, final_commentary.as_deref())?;

    Ok(BatchOutcome {
        run_id,
        period,
        status,
        commentary: final_commentary,
        skipped: false,
        sources: counts,
        completed_at: now_utc_string(),
    })
}

fn ingest_sources(
    connection: &mut Connection,
    run_id: i64,
    period: Period,
    sources: &[(String, TermDataset)],
) -> IngestResult<Vec<SourceCounts>> {
    let tx = connection.transaction()?;
    let mut counts = Vec::with_capacity(sources.len());

    for (alias, dataset) in sources {
        let source_id = resolve_source(&tx, alias)?;
        if dataset.is_empty() {
            warn!(alias = %alias, "empty term dataset");
        }

        let mut source_counts = SourceCounts {
            source_alias: alias.clone(),
            source_id: Some(source_id),
            ..SourceCounts::default()
        };

        for (index, row) in dataset.rows.iter().enumerate() {
            let record = row
                .parse(index + 1, period)
                .map_err(|err| with_source_context(err, alias))?;
            source_counts.rows_seen += 1;

            match upsert_term(&tx, &record.term, record.frequency, source_id, run_id)? {
                UpsertOutcome::Inserted => source_counts.inserted += 1,
                UpsertOutcome::Skipped => source_counts.duplicates += 1,
            }
        }

        info!(
            alias = %alias,
            source_id,
            rows = source_counts.rows_seen,
            inserted = source_counts.inserted,
            duplicates = source_counts.duplicates,
            "source staged"
        );
        counts.push(source_counts);
    }

    tx.commit()?;
    Ok(counts)
}

fn with_source_context(err: IngestError, alias: &str) -> IngestError {
    match err {
        IngestError::RowRead { row, reason } => IngestError::RowRead {
            row,
            reason: format!("{alias}: {reason}"),
        },
        other => other,
    }
}

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{Period, RunRecord, SourceRecord};
use crate::store::{count_terms, find_run, list_runs, list_sources, open_database, schema_version};

#[derive(Debug, Serialize)]
struct StatusReport {
    db_path: String,
    db_schema_version: Option<String>,
    runs: Vec<RunSummary>,
    sources: Vec<SourceRecord>,
    terms_total: i64,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    #[serde(flatten)]
    run: RunRecord,
    terms: i64,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = &args.database.db_path;
    info!(path = %db_path.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = open_database(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let runs = match (args.year, args.month) {
        (Some(year), Some(month)) => find_run(&connection, Period::new(year, month)?)?
            .into_iter()
            .collect(),
        _ => list_runs(&connection, args.limit)?,
    };
    let runs = runs
        .into_iter()
        .map(|run| {
            let terms = count_terms(&connection, Some(run.run_id), None)?;
            Ok(RunSummary { run, terms })
        })
        .collect::<Result<Vec<_>>>()?;

    let report = StatusReport {
        db_path: db_path.display().to_string(),
        db_schema_version: schema_version(&connection)?,
        runs,
        sources: list_sources(&connection)?,
        terms_total: count_terms(&connection, None, None)?,
    };

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to render status report")?;
        println!("{rendered}");
        return Ok(());
    }

    info!(
        schema_version = %report.db_schema_version.as_deref().unwrap_or("unknown"),
        sources = report.sources.len(),
        terms = report.terms_total,
        "database status"
    );
    for summary in &report.runs {
        info!(
            run_id = summary.run.run_id,
            period = %summary.run.period,
            status = %summary.run.status,
            terms = summary.terms,
            updated_at = %summary.run.updated_at,
            commentary = %summary.run.commentary.as_deref().unwrap_or_default(),
            "run"
        );
    }

    Ok(())
}

pub mod ingest;
pub mod pipeline;
pub mod status;

use anyhow::{Result, bail};
use chrono::Local;
use tracing::{info, warn};

use crate::cli::BatchArgs;
use crate::model::{BatchOutcome, Period, RunStatus};
use crate::util::write_json_pretty;

fn resolve_period(args: &BatchArgs) -> Result<Period> {
    let default = Period::previous_month(Local::now().date_naive());
    let period = Period::new(
        args.year.unwrap_or(default.year),
        args.month.unwrap_or(default.month),
    )?;
    Ok(period)
}

fn finish_batch(args: &BatchArgs, outcome: &BatchOutcome) -> Result<()> {
    if let Some(path) = &args.report_path {
        write_json_pretty(path, outcome)?;
        info!(path = %path.display(), "wrote batch report");
    }

    match outcome.status {
        RunStatus::Success => info!(
            run_id = outcome.run_id,
            period = %outcome.period,
            skipped = outcome.skipped,
            inserted = outcome.inserted_total(),
            "batch completed"
        ),
        status => {
            let reason = outcome.commentary.clone().unwrap_or_default();
            warn!(run_id = outcome.run_id, status = %status, reason = %reason, "batch did not succeed");
            if args.fail_on_fatal {
                bail!("run {} ended with status {status}: {reason}", outcome.run_id);
            }
        }
    }

    Ok(())
}

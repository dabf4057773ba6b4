use anyhow::{Context, Result};
use tracing::info;

use crate::cli::IngestArgs;
use crate::dataset::{parse_source_arg, read_dataset};
use crate::store::{insert_batch, open_database};

use super::{finish_batch, resolve_period};

pub fn run(args: IngestArgs) -> Result<()> {
    let period = resolve_period(&args.batch)?;

    let mut sources = Vec::with_capacity(args.sources.len());
    for value in &args.sources {
        let (alias, path) = parse_source_arg(value)?;
        let dataset = read_dataset(&path)?;
        info!(alias = %alias, path = %path.display(), rows = dataset.len(), "loaded term dataset");
        sources.push((alias, dataset));
    }

    let db_path = &args.database.db_path;
    let mut connection = open_database(db_path)
        .with_context(|| format!("failed to prepare database {}", db_path.display()))?;

    let outcome = insert_batch(
        &mut connection,
        period,
        args.batch.commentary.as_deref(),
        &sources,
    )?;

    finish_batch(&args.batch, &outcome)
}

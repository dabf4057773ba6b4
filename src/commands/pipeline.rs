use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::PipelineArgs;
use crate::config::Secret;
use crate::dataset::write_dataset;
use crate::headlines::{HeadlineClient, NewsSource};
use crate::model::TermDataset;
use crate::store::{insert_batch, open_database};
use crate::transform::Tokenizer;

use super::{finish_batch, resolve_period};

pub fn run(args: PipelineArgs) -> Result<()> {
    let period = resolve_period(&args.batch)?;

    let mut selected = Vec::new();
    if !args.skip_nyt {
        let key = Secret {
            name: "SOURCE_KEY_NYT",
            value: args.nyt_key.clone(),
            file: args.nyt_key_file.clone(),
        }
        .require()?;
        selected.push((NewsSource::NewYorkTimes, key));
    }
    if !args.skip_guardian {
        let key = Secret {
            name: "SOURCE_KEY_GUARDIAN",
            value: args.guardian_key.clone(),
            file: args.guardian_key_file.clone(),
        }
        .require()?;
        selected.push((NewsSource::Guardian, key));
    }
    if selected.is_empty() {
        bail!("every source was skipped; nothing to ingest");
    }

    let db_path = &args.database.db_path;
    let mut connection = open_database(db_path)
        .with_context(|| format!("failed to prepare database {}", db_path.display()))?;

    info!(period = %period, sources = selected.len(), "requesting headlines");
    let client = HeadlineClient::new()?;
    let tokenizer = Tokenizer::new()?;

    let mut sources: Vec<(String, TermDataset)> = Vec::with_capacity(selected.len());
    for (source, key) in &selected {
        let headlines = client.fetch_headlines(*source, period, key)?;
        let dataset = tokenizer.aggregate(&headlines, period);
        info!(source = source.alias(), terms = dataset.len(), "built term dataset");

        if let Some(dir) = &args.export_dir {
            let file_name = format!(
                "{}_{}.csv",
                source.alias().to_lowercase().replace(' ', "_"),
                period
            );
            write_dataset(&dir.join(file_name), period, &dataset)?;
        }

        sources.push((source.alias().to_string(), dataset));
    }

    let outcome = insert_batch(
        &mut connection,
        period,
        args.batch.commentary.as_deref(),
        &sources,
    )?;

    finish_batch(&args.batch, &outcome)
}

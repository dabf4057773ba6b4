use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_DB_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "nuada",
    version,
    about = "News headline term-frequency ingestion"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Pipeline(PipelineArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    #[arg(long, env = "NUADA_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long)]
    pub commentary: Option<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fail_on_fatal: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub batch: BatchArgs,

    #[arg(long = "source", required = true)]
    pub sources: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub batch: BatchArgs,

    #[arg(long, env = "SOURCE_KEY_NYT", hide_env_values = true)]
    pub nyt_key: Option<String>,

    #[arg(long, env = "SOURCE_KEY_NYT_FILE")]
    pub nyt_key_file: Option<PathBuf>,

    #[arg(long, env = "SOURCE_KEY_GUARDIAN", hide_env_values = true)]
    pub guardian_key: Option<String>,

    #[arg(long, env = "SOURCE_KEY_GUARDIAN_FILE")]
    pub guardian_key_file: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_nyt: bool,

    #[arg(long, default_value_t = false)]
    pub skip_guardian: bool,

    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long, default_value_t = 12)]
    pub limit: usize,

    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

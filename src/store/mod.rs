mod batch;
mod run_ledger;
mod schema;
mod source_registry;
mod term_upsert;

pub use batch::insert_batch;
pub use run_ledger::{find_run, list_runs};
pub use schema::{open_database, schema_version};
pub use source_registry::list_sources;
pub use term_upsert::count_terms;

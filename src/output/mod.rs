//! Output module for harvested records
//!
//! This module handles:
//! - Writing the daily CSV file and its issues report
//! - Appending records to a SQLite table in batches
//! - Printing the end-of-run summary

mod csv_sink;
mod schema;
mod sqlite_sink;
mod summary;
mod traits;

pub use csv_sink::CsvSink;
pub use schema::{create_table_sql, initialize_table, insert_sql};
pub use sqlite_sink::{append_records, SqliteSink};
pub use summary::{print_summary, RunSummary};
pub use traits::{RecordSink, SinkError, SinkOutcome, SinkReport, SinkResult};

use crate::config::Config;
use crate::crawler::HarvestRun;

/// Builds the sinks named by the configuration
///
/// The CSV sink is always present. The SQLite sink is added when the
/// `[relational]` section exists and `relational` is true.
///
/// # Returns
///
/// * `Ok(Vec<Box<dyn RecordSink>>)` - Sinks in write order
/// * `Err(SinkError)` - The relational sink is configured but unusable
pub fn build_sinks(config: &Config, relational: bool) -> SinkResult<Vec<Box<dyn RecordSink>>> {
    let mut sinks: Vec<Box<dyn RecordSink>> = vec![Box::new(CsvSink::new(
        &config.output.dir,
        &config.catalog.source,
    ))];

    if relational {
        if let Some(section) = &config.relational {
            sinks.push(Box::new(SqliteSink::from_config(section)?));
        }
    }

    Ok(sinks)
}

/// Hands the run to every sink in turn
///
/// A failing sink is logged and reported; the remaining sinks still run.
pub fn write_outputs(run: &HarvestRun, sinks: &mut [Box<dyn RecordSink>]) -> Vec<SinkOutcome> {
    sinks
        .iter_mut()
        .map(|sink| {
            let result = sink.write(run);
            if let Err(e) = &result {
                tracing::error!("{} sink failed: {}", sink.name(), e);
            }
            SinkOutcome {
                sink: sink.name().to_string(),
                result,
            }
        })
        .collect()
}

//! SQLite sink
//!
//! Appends every record of a run to a table, `chunk-size` rows per
//! transaction. Rows are appended, never upserted: harvesting the same
//! catalog twice stores its records twice.

use crate::config::validation::validate_identifier;
use crate::config::RelationalConfig;
use crate::crawler::HarvestRun;
use crate::output::schema::{initialize_table, insert_sql};
use crate::output::traits::{RecordSink, SinkError, SinkReport, SinkResult};
use crate::record::Record;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Relational sink backed by a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
    table: String,
    chunk_size: usize,
}

impl SqliteSink {
    /// Creates a sink; the database is opened only when the run is written
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Table name and chunk size are usable
    /// * `Err(SinkError)` - Invalid table name or zero chunk size
    pub fn new(path: impl Into<PathBuf>, table: &str, chunk_size: usize) -> SinkResult<Self> {
        validate_identifier(table).map_err(|e| SinkError::Config(e.to_string()))?;
        if chunk_size == 0 {
            return Err(SinkError::Config("chunk size must be at least 1".to_string()));
        }

        Ok(Self {
            path: path.into(),
            table: table.to_string(),
            chunk_size,
        })
    }

    /// Creates a sink from the `[relational]` section
    ///
    /// The database path comes from `CATALOG_HARVEST_DATABASE` when set,
    /// otherwise from `database-path`.
    pub fn from_config(config: &RelationalConfig) -> SinkResult<Self> {
        let path = config.resolve_database_path().ok_or_else(|| {
            SinkError::Config(format!(
                "no database path: set database-path or {}",
                crate::config::DATABASE_ENV_VAR
            ))
        })?;
        Self::new(path, &config.table, config.chunk_size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> SinkResult<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(SinkError::io(parent))?;
        }

        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Ok(conn)
    }
}

impl RecordSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn write(&mut self, run: &HarvestRun) -> SinkResult<SinkReport> {
        let mut conn = self.open()?;
        let batches = append_records(&mut conn, &self.table, self.chunk_size, &run.records)?;

        tracing::info!(
            "Appended {} records to {} in {}, {} batches",
            run.records.len(),
            self.table,
            self.path.display(),
            batches.len()
        );

        Ok(SinkReport {
            rows: batches.iter().sum(),
            batches,
            location: format!("{}:{}", self.path.display(), self.table),
        })
    }
}

/// Appends records to `table`, committing one transaction per chunk
///
/// Creates the table if needed. Returns the size of each committed batch.
/// When a batch fails, the batches before it stay committed.
pub fn append_records(
    conn: &mut Connection,
    table: &str,
    chunk_size: usize,
    records: &[Record],
) -> SinkResult<Vec<usize>> {
    validate_identifier(table).map_err(|e| SinkError::Config(e.to_string()))?;
    if chunk_size == 0 {
        return Err(SinkError::Config("chunk size must be at least 1".to_string()));
    }

    initialize_table(conn, table)?;
    let sql = insert_sql(table);

    let mut batches = Vec::new();
    for chunk in records.chunks(chunk_size) {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for record in chunk {
                stmt.execute(params![
                    record.item_id,
                    record.item_name,
                    record.item_category,
                    record.item_description,
                    record.item_price,
                    record.item_image,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Committed batch of {} rows to {}", chunk.len(), table);
        batches.push(chunk.len());
    }

    Ok(batches)
}

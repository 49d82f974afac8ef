//! CSV file sink
//!
//! Writes `<dir>/<source>_<YYYY-MM-DD>.csv` with a header row and one row
//! per record. When the run has issues or was truncated,
//! `<source>_<YYYY-MM-DD>_issues.csv` is written next to it so partial
//! output is labeled as such.

use crate::crawler::HarvestRun;
use crate::output::traits::{RecordSink, SinkError, SinkReport, SinkResult};
use crate::record::{Field, Issue};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const ISSUE_COLUMNS: [&str; 4] = ["url", "item_id", "state", "reason"];
const TRUNCATED_STATE: &str = "truncated";

/// Daily CSV file writer
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    source: String,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            source: source.into(),
        }
    }

    /// Record file for a run on `date`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", self.source, date.format("%Y-%m-%d")))
    }

    /// Issues file for a run on `date`
    pub fn issues_path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}_issues.csv", self.source, date.format("%Y-%m-%d")))
    }

    /// Writes the issues file, or removes a stale one when the run is clean
    ///
    /// A truncated run gets a leading run-level row (empty url and item id,
    /// state `truncated`) carrying the termination reason.
    fn write_issues(&self, path: &Path, run: &HarvestRun) -> SinkResult<()> {
        let truncated = run.termination.is_truncated();
        if run.issues.is_empty() && !truncated {
            // A clean rerun must not leave an earlier run's issues behind
            return match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(SinkError::io(path)(e)),
            };
        }

        replace_file(path, |writer| {
            writer.write_record(ISSUE_COLUMNS)?;
            if truncated {
                let reason = run.termination.to_string();
                writer.write_record(["", "", TRUNCATED_STATE, reason.as_str()])?;
            }
            for issue in &run.issues {
                writer.write_record([
                    issue.url.as_str(),
                    issue.item_id.as_deref().unwrap_or(""),
                    issue.state().to_db_string(),
                    issue.kind.as_str(),
                ])?;
            }
            Ok(())
        })
    }
}

impl RecordSink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&mut self, run: &HarvestRun) -> SinkResult<SinkReport> {
        fs::create_dir_all(&self.dir).map_err(SinkError::io(&self.dir))?;

        let date = run.run_date();
        let path = self.path_for(date);

        replace_file(&path, |writer| {
            writer.write_record(Field::COLUMNS.iter().map(|field| field.as_str()))?;
            for record in &run.records {
                writer.write_record(record.values())?;
            }
            Ok(())
        })?;

        // The record file is already in place; an issues file failure is logged only
        let issues_path = self.issues_path_for(date);
        match self.write_issues(&issues_path, run) {
            Ok(()) if run.termination.is_truncated() => tracing::warn!(
                "Run {}; {} issues written to {}",
                run.termination,
                run.issues.len(),
                issues_path.display()
            ),
            Ok(()) if !run.issues.is_empty() => tracing::warn!(
                "{} issues written to {}",
                run.issues.len(),
                issues_path.display()
            ),
            Ok(()) => {}
            Err(e) => tracing::warn!("Issues file {} not written: {}", issues_path.display(), e),
        }

        tracing::info!("Wrote {} records to {}", run.records.len(), path.display());

        Ok(SinkReport {
            rows: run.records.len(),
            batches: vec![run.records.len()],
            location: path.display().to_string(),
        })
    }
}

/// Writes a CSV file through a temporary sibling, then renames it over `path`
///
/// The temporary file is removed when any step fails.
fn replace_file<F>(path: &Path, fill: F) -> SinkResult<()>
where
    F: FnOnce(&mut csv::Writer<fs::File>) -> SinkResult<()>,
{
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let written = csv::Writer::from_path(&partial)
        .map_err(SinkError::from)
        .and_then(|mut writer| {
            fill(&mut writer)?;
            writer.flush().map_err(SinkError::io(&partial))
        })
        .and_then(|()| fs::rename(&partial, path).map_err(SinkError::io(path)));

    if written.is_err() {
        let _ = fs::remove_file(&partial);
    }
    written
}

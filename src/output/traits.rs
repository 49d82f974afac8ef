//! Sink trait and associated types
//!
//! Sinks receive the finished [`HarvestRun`] exactly once. Each sink reports
//! its own result so a failure in one never hides the output of another.

use crate::crawler::HarvestRun;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sink configuration error: {0}")]
    Config(String),
}

impl SinkError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// What a sink wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    /// Record rows written, header excluded
    pub rows: usize,

    /// Rows per committed batch, in commit order
    pub batches: Vec<usize>,

    /// File or database the rows went to
    pub location: String,
}

/// The result of one sink
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: String,
    pub result: SinkResult<SinkReport>,
}

impl SinkOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Trait for record sinks
///
/// Writing the same run twice must leave the sink in an equivalent state
/// (file sinks) or append the same rows again (the relational sink).
pub trait RecordSink {
    /// Short name used in logs and the summary
    fn name(&self) -> &str;

    /// Writes every record of the run, in order
    ///
    /// # Arguments
    ///
    /// * `run` - The finished harvest
    fn write(&mut self, run: &HarvestRun) -> SinkResult<SinkReport>;
}

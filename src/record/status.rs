/// Record outcome definitions for tracking harvest quality
///
/// Every detail URL ends in exactly one state. Anything short of complete is
/// described by one or more issues.
use crate::record::Record;
use std::fmt;

/// Final state of one detail URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordState {
    /// Record extracted and image stored without problems
    Complete,

    /// Usable but flawed: the record has a missing image or a bad id, or
    /// the detail page could not be fetched at all
    Degraded,

    /// Detail page fetched but no record could be built from it
    Failed,
}

impl RecordState {
    /// Converts the state to its stable string form
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its stable string form
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "complete" => Some(Self::Complete),
            "degraded" => Some(Self::Degraded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// What went wrong with a detail URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Detail page could not be fetched, retries included; no record
    FetchFailed,

    /// Record kept, image could not be downloaded or written
    AssetMissing,

    /// Record kept, but its id selector matched nothing
    MissingId,

    /// Record kept, but an earlier record already used the same id
    DuplicateId,

    /// Detail page could not be turned into a record
    Structural,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch-failed",
            Self::AssetMissing => "asset-missing",
            Self::MissingId => "missing-id",
            Self::DuplicateId => "duplicate-id",
            Self::Structural => "structural",
        }
    }

    /// The record state this issue implies
    pub fn state(&self) -> RecordState {
        match self {
            Self::Structural => RecordState::Failed,
            _ => RecordState::Degraded,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A problem recorded against one detail URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Detail page URL
    pub url: String,

    /// Id of the affected record, when one was extracted
    pub item_id: Option<String>,

    pub kind: IssueKind,

    /// Human-readable explanation
    pub detail: String,
}

impl Issue {
    pub fn new(url: impl Into<String>, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            item_id: None,
            kind,
            detail: detail.into(),
        }
    }

    /// Attaches the id of the affected record
    pub fn for_record(mut self, record: &Record) -> Self {
        self.item_id = Some(record.item_id.clone());
        self
    }

    pub fn state(&self) -> RecordState {
        self.kind.state()
    }
}

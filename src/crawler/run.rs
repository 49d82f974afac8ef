//! Run-scoped harvest result
//!
//! A [`HarvestRun`] is built up by the coordinator while it crawls and is
//! handed to every sink once the crawl has stopped. Nothing outside the
//! coordinator appends to it.

use crate::output::RunSummary;
use crate::record::{Issue, IssueKind, Record, RecordState};
use chrono::{DateTime, Local, NaiveDate};
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

/// Why the crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// A listing page had no entries
    EndOfCatalog,

    /// The `max-pages` guard was reached
    PageLimit,

    /// A listing page could not be fetched
    ListingFailed(String),

    /// The cancellation token fired
    Cancelled,
}

impl Termination {
    /// True when the catalog may have more items than were collected
    pub fn is_truncated(&self) -> bool {
        !matches!(self, Self::EndOfCatalog)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfCatalog => write!(f, "end of catalog"),
            Self::PageLimit => write!(f, "page limit reached (truncated)"),
            Self::ListingFailed(reason) => write!(f, "listing failed (truncated): {}", reason),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything a harvest produced
#[derive(Debug, Clone)]
pub struct HarvestRun {
    /// Complete and degraded records in discovery order
    pub records: Vec<Record>,

    /// One entry per problem, in the order they were found
    pub issues: Vec<Issue>,

    pub summary: RunSummary,

    pub termination: Termination,

    pub started_at: DateTime<Local>,
}

impl HarvestRun {
    /// A run holding the given records and nothing else
    pub fn from_records(records: Vec<Record>) -> Self {
        let summary = RunSummary {
            succeeded: records.len(),
            ..RunSummary::default()
        };
        Self {
            records,
            issues: Vec::new(),
            summary,
            termination: Termination::EndOfCatalog,
            started_at: Local::now(),
        }
    }

    /// Calendar date used in output file names
    pub fn run_date(&self) -> NaiveDate {
        self.started_at.date_naive()
    }

    pub fn is_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// What processing one detail URL produced
#[derive(Debug)]
pub(crate) enum DetailOutcome {
    /// A record was built; `issues` lists anything that degraded it
    Extracted {
        url: String,
        record: Record,
        issues: Vec<Issue>,
        asset_stored: bool,
    },

    /// No record could be built
    Skipped(Issue),

    /// Cancellation was observed before the URL was processed
    Cancelled,
}

/// Builds a [`HarvestRun`] one outcome at a time
#[derive(Debug)]
pub(crate) struct RunAccumulator {
    records: Vec<Record>,
    issues: Vec<Issue>,
    seen_ids: HashSet<String>,
    summary: RunSummary,
    started: Instant,
    started_at: DateTime<Local>,
}

impl RunAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
            seen_ids: HashSet::new(),
            summary: RunSummary::default(),
            started: Instant::now(),
            started_at: Local::now(),
        }
    }

    pub(crate) fn add_detail_urls(&mut self, count: usize) {
        self.summary.detail_urls += count;
    }

    pub(crate) fn push(&mut self, outcome: DetailOutcome) {
        match outcome {
            DetailOutcome::Extracted {
                url,
                record,
                mut issues,
                asset_stored,
            } => {
                if !record.item_id.is_empty() && !self.seen_ids.insert(record.item_id.clone()) {
                    tracing::warn!("Duplicate item id {} at {}", record.item_id, url);
                    issues.push(
                        Issue::new(
                            url,
                            IssueKind::DuplicateId,
                            format!("item id {} was already harvested in this run", record.item_id),
                        )
                        .for_record(&record),
                    );
                }

                if issues.is_empty() {
                    self.summary.succeeded += 1;
                } else {
                    self.summary.degraded += 1;
                }
                if asset_stored {
                    self.summary.assets_stored += 1;
                }

                self.records.push(record);
                self.issues.extend(issues);
            }
            DetailOutcome::Skipped(issue) => {
                match issue.state() {
                    RecordState::Failed => self.summary.failed += 1,
                    _ => self.summary.degraded += 1,
                }
                self.issues.push(issue);
            }
            DetailOutcome::Cancelled => {}
        }
    }

    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn finish(mut self, pages_fetched: u32, termination: Termination) -> HarvestRun {
        self.summary.pages_fetched = pages_fetched;
        self.summary.elapsed = self.started.elapsed();

        HarvestRun {
            records: self.records,
            issues: self.issues,
            summary: self.summary,
            termination,
            started_at: self.started_at,
        }
    }
}

//! End-of-run counts and their console report

use crate::crawler::HarvestRun;
use crate::output::SinkOutcome;
use crate::record::IssueKind;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counts collected while a harvest runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Listing pages fetched, including the empty one that ended the crawl
    pub pages_fetched: u32,

    /// Detail URLs discovered on listing pages
    pub detail_urls: usize,

    /// Records extracted without any issue
    pub succeeded: usize,

    /// Records kept with an issue, plus detail pages that could not be fetched
    pub degraded: usize,

    /// Detail pages whose record could not be built
    pub failed: usize,

    /// Images written to disk
    pub assets_stored: usize,

    pub elapsed: Duration,
}

impl RunSummary {
    /// Detail URLs that reached a final outcome
    pub fn processed(&self) -> usize {
        self.succeeded + self.degraded + self.failed
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / processed as f64) * 100.0
    }
}

/// Prints the run summary and the sink results to stdout
///
/// # Arguments
///
/// * `run` - The finished harvest
/// * `outcomes` - One entry per sink that was attempted
pub fn print_summary(run: &HarvestRun, outcomes: &[SinkOutcome]) {
    let summary = &run.summary;

    println!("=== Harvest Summary ===\n");

    println!("Run:");
    println!("  Started: {}", run.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!("  Ended: {}", run.termination);
    println!();

    println!("Crawl:");
    println!("  Listing pages fetched: {}", summary.pages_fetched);
    println!("  Detail URLs found: {}", summary.detail_urls);
    println!("  Images stored: {}", summary.assets_stored);
    println!();

    println!("Records:");
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Degraded: {}", summary.degraded);
    println!("  Failed: {}", summary.failed);
    println!();

    if !run.issues.is_empty() {
        let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
        for issue in &run.issues {
            *by_kind.entry(issue.kind.as_str()).or_insert(0) += 1;
        }

        println!("Issues:");
        for kind in [
            IssueKind::FetchFailed,
            IssueKind::AssetMissing,
            IssueKind::MissingId,
            IssueKind::DuplicateId,
            IssueKind::Structural,
        ] {
            if let Some(count) = by_kind.get(kind.as_str()) {
                println!("  {}: {}", kind, count);
            }
        }
        println!();
    }

    if !outcomes.is_empty() {
        println!("Sinks:");
        for outcome in outcomes {
            match &outcome.result {
                Ok(report) => println!(
                    "  {}: {} rows -> {}",
                    outcome.sink, report.rows, report.location
                ),
                Err(e) => println!("  {}: FAILED ({})", outcome.sink, e),
            }
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} detail pages)",
        summary.success_rate(),
        summary.succeeded,
        summary.processed()
    );
}

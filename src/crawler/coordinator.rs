//! Harvest coordinator - main crawl orchestration logic
//!
//! This module contains the main harvest loop that ties the other crawler
//! pieces together:
//! - Walking the listing with the [`Paginator`]
//! - Fetching each detail page and extracting its record
//! - Storing the product image
//! - Accumulating records and issues into a [`HarvestRun`]
//! - Stopping cleanly on cancellation

use crate::config::{CatalogConfig, Config};
use crate::crawler::assets::AssetStore;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::paginator::{PageOutcome, Paginator};
use crate::crawler::run::{DetailOutcome, HarvestRun, RunAccumulator, Termination};
use crate::extract::{extract_from_html, ExtractionRuleSet, ListingSelectors};
use crate::record::{Issue, IssueKind};
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main harvest coordinator structure
#[derive(Debug)]
pub struct Coordinator {
    fetcher: Fetcher,
    selectors: ListingSelectors,
    rules: ExtractionRuleSet,
    catalog: CatalogConfig,
    assets: AssetStore,
    workers: usize,
}

impl Coordinator {
    /// Creates a coordinator with an HTTP client built from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The client or the selectors could not be built
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::from_config(&config.http)?;
        Self::with_fetcher(config, fetcher)
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(config: &Config, fetcher: Fetcher) -> Result<Self, HarvestError> {
        Ok(Self {
            fetcher,
            selectors: ListingSelectors::from_config(&config.listing)?,
            rules: ExtractionRuleSet::from_config(&config.fields)?,
            catalog: config.catalog.clone(),
            assets: AssetStore::new(config.output.images_dir()),
            workers: config.http.workers.max(1) as usize,
        })
    }

    /// Runs the harvest until the catalog ends, the page limit is hit, a
    /// listing page fails for good, or `cancel` fires
    ///
    /// Per-record failures never end the run; they are recorded as issues.
    pub async fn run(&self, cancel: &CancellationToken) -> HarvestRun {
        tracing::info!(
            "Starting harvest of {} at offset {}",
            self.catalog.source,
            self.catalog.start_offset
        );

        let mut acc = RunAccumulator::new();
        let mut paginator = Paginator::new(
            self.fetcher.clone(),
            self.selectors.clone(),
            &self.catalog,
        );

        let termination = loop {
            if cancel.is_cancelled() {
                tracing::warn!("Harvest cancelled before offset {}", paginator.cursor().offset);
                break Termination::Cancelled;
            }

            let detail_urls = match paginator.next_page().await {
                Ok(PageOutcome::Items { detail_urls, .. }) => detail_urls,
                Ok(PageOutcome::EndOfCatalog { offset }) => {
                    tracing::info!("Catalog ended at offset {}", offset);
                    break Termination::EndOfCatalog;
                }
                Ok(PageOutcome::PageLimit { pages }) => {
                    tracing::warn!(
                        "Stopped after {} listing pages (max-pages); the catalog may have more items",
                        pages
                    );
                    break Termination::PageLimit;
                }
                Err(e) => {
                    tracing::error!("Listing page failed, stopping pagination: {}", e);
                    break Termination::ListingFailed(e.to_string());
                }
            };

            acc.add_detail_urls(detail_urls.len());

            // Ordered so records keep discovery order whatever the worker count
            let mut outcomes = stream::iter(detail_urls)
                .map(|url| async move { self.process_detail(url, cancel).await })
                .buffered(self.workers);

            while let Some(outcome) = outcomes.next().await {
                acc.push(outcome);
            }

            tracing::info!(
                "Progress: {} records after {} listing pages",
                acc.record_count(),
                paginator.pages_fetched()
            );
        };

        let run = acc.finish(paginator.pages_fetched(), termination);
        tracing::info!(
            "Harvest finished ({}): {} succeeded, {} degraded, {} failed in {:?}",
            run.termination,
            run.summary.succeeded,
            run.summary.degraded,
            run.summary.failed,
            run.summary.elapsed
        );
        run
    }

    /// Fetches one detail page, extracts its record and stores its image
    async fn process_detail(&self, url: Url, cancel: &CancellationToken) -> DetailOutcome {
        if cancel.is_cancelled() {
            return DetailOutcome::Cancelled;
        }

        tracing::debug!("Processing detail page {}", url);

        let page = match self.fetcher.get_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                return DetailOutcome::Skipped(Issue::new(
                    url.as_str(),
                    IssueKind::FetchFailed,
                    e.to_string(),
                ));
            }
        };

        // The discovered URL carries the category path; redirects may not
        let extraction = match extract_from_html(&page.body, &url, &self.rules) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!("Cannot build a record from {}: {}", url, e);
                return DetailOutcome::Skipped(Issue::new(
                    url.as_str(),
                    IssueKind::Structural,
                    e.to_string(),
                ));
            }
        };

        let record = extraction.record;
        if !extraction.missing.is_empty() {
            let names: Vec<&str> = extraction.missing.iter().map(|f| f.as_str()).collect();
            tracing::debug!("No match at {} for: {}", url, names.join(", "));
        }

        let mut issues = Vec::new();
        let mut asset_stored = false;

        if record.item_id.is_empty() {
            tracing::warn!("Record at {} has no item id; image not stored", url);
            issues.push(
                Issue::new(url.as_str(), IssueKind::MissingId, "item id selector matched nothing")
                    .for_record(&record),
            );
        } else {
            match self
                .assets
                .fetch_asset(&self.fetcher, &record.item_image, &record.item_id)
                .await
            {
                Ok(_) => asset_stored = true,
                Err(e) => {
                    tracing::warn!("Image for {} not stored: {}", record.item_id, e);
                    issues.push(
                        Issue::new(url.as_str(), IssueKind::AssetMissing, e.to_string())
                            .for_record(&record),
                    );
                }
            }
        }

        tracing::info!("Harvested {} ({})", record.item_id, record.item_name);

        DetailOutcome::Extracted {
            url: url.to_string(),
            record,
            issues,
            asset_stored,
        }
    }
}

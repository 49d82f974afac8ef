//! Crawler module for catalog harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic and per-host politeness delays
//! - Offset pagination over the catalog listing
//! - Product image storage
//! - Overall harvest coordination

mod assets;
mod coordinator;
mod fetcher;
mod limiter;
mod paginator;
mod retry;
mod run;

pub use assets::{AssetStore, ASSET_EXTENSION};
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use limiter::RateLimiter;
pub use paginator::{CatalogPage, PageOutcome, Paginator};
pub use retry::{RetryDecision, RetryPolicy, MAX_RETRY_DELAY};
pub use run::{HarvestRun, Termination};

use crate::config::Config;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete harvest
///
/// This is the main entry point for harvesting a catalog. It will:
/// 1. Build the HTTP client and compile the selectors
/// 2. Walk the listing until the first empty page
/// 3. Extract a record from every detail page and store its image
/// 4. Return the accumulated run for the sinks
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `cancel` - Stops the harvest between pages and detail URLs
///
/// # Returns
///
/// * `Ok(HarvestRun)` - The harvest ran; check its termination and issues
/// * `Err(HarvestError)` - The harvest could not start
pub async fn harvest(config: &Config, cancel: &CancellationToken) -> Result<HarvestRun, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run(cancel).await)
}

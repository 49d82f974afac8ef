//! Listing page parsing
//!
//! A listing page is a list of product entries. Each entry carries one link
//! to the product's detail page. The number of entries, not the number of
//! links, decides whether the catalog has ended.

use crate::config::ListingConfig;
use crate::extract::rules::parse_selector;
use crate::ConfigError;
use scraper::{Html, Selector};
use url::Url;

/// Compiled selectors for listing pages
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    item: Selector,
    link: Selector,
    link_attribute: String,
}

impl ListingSelectors {
    /// Compiles the `[listing]` configuration
    pub fn from_config(config: &ListingConfig) -> Result<Self, ConfigError> {
        if config.link_attribute.is_empty() {
            return Err(ConfigError::Validation(
                "link_attribute cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            item: parse_selector("listing.item-selector", &config.item_selector)?,
            link: parse_selector("listing.link-selector", &config.link_selector)?,
            link_attribute: config.link_attribute.clone(),
        })
    }
}

/// What one listing page contained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Number of product entries matched
    pub item_count: usize,

    /// Absolute detail URLs in page order
    pub detail_urls: Vec<Url>,
}

impl ListingPage {
    /// True when the page matched no product entries
    pub fn is_end_of_catalog(&self) -> bool {
        self.item_count == 0
    }
}

/// Parses a listing page and collects its detail links
///
/// Entries without a usable link still count towards `item_count`, so a
/// page of broken entries does not end the crawl early.
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `base_url` - The listing URL, used to resolve relative links
/// * `selectors` - Compiled listing selectors
pub fn parse_listing(html: &str, base_url: &Url, selectors: &ListingSelectors) -> ListingPage {
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();

    for item in document.select(&selectors.item) {
        page.item_count += 1;

        let href = item
            .select(&selectors.link)
            .next()
            .and_then(|link| link.value().attr(&selectors.link_attribute));

        match href.and_then(|href| resolve_link(href, base_url)) {
            Some(url) => page.detail_urls.push(url),
            None => tracing::debug!(
                "Listing entry {} on {} has no usable detail link",
                page.item_count,
                base_url
            ),
        }
    }

    page
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only links and non-web schemes
/// such as `javascript:` or `mailto:`.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}

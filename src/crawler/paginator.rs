//! Listing pagination
//!
//! The catalog listing is walked by numeric offset. Each call to
//! [`Paginator::next_page`] fetches one listing page and returns its detail
//! URLs; the first page with no product entries ends the crawl, and the page
//! after it is never requested.

use crate::config::CatalogConfig;
use crate::crawler::fetcher::Fetcher;
use crate::extract::{parse_listing, ListingSelectors};
use crate::url::listing_url;
use crate::FetchError;
use url::Url;

/// Transient cursor over the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPage {
    pub offset: u64,
    pub page_size: u64,
}

impl CatalogPage {
    pub fn advance(self) -> Self {
        Self {
            offset: self.offset + self.page_size,
            page_size: self.page_size,
        }
    }
}

/// Result of asking for the next listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Detail URLs found on the page at `offset`, in page order
    Items { offset: u64, detail_urls: Vec<Url> },

    /// The page at `offset` had no product entries
    EndOfCatalog { offset: u64 },

    /// The iteration guard stopped the crawl before the catalog ended
    PageLimit { pages: u32 },
}

/// Drives the offset loop over the catalog listing
#[derive(Debug)]
pub struct Paginator {
    fetcher: Fetcher,
    selectors: ListingSelectors,
    template: String,
    cursor: CatalogPage,
    max_pages: u32,
    pages_fetched: u32,
    finished: Option<PageOutcome>,
}

impl Paginator {
    pub fn new(fetcher: Fetcher, selectors: ListingSelectors, catalog: &CatalogConfig) -> Self {
        Self {
            fetcher,
            selectors,
            template: catalog.listing_url.clone(),
            cursor: CatalogPage {
                offset: catalog.start_offset,
                page_size: catalog.page_size,
            },
            max_pages: catalog.max_pages,
            pages_fetched: 0,
            finished: None,
        }
    }

    /// Listing pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// True once the catalog end or the page limit has been reached
    pub fn is_done(&self) -> bool {
        self.finished.is_some()
    }

    /// Current cursor position
    pub fn cursor(&self) -> CatalogPage {
        self.cursor
    }

    /// Fetches the next listing page and advances the cursor
    ///
    /// A listing fetch that still fails after all retries is returned as an
    /// error; the cursor is not advanced in that case. Once the catalog end
    /// or the page limit is reached, every later call returns that same
    /// outcome without fetching.
    pub async fn next_page(&mut self) -> Result<PageOutcome, FetchError> {
        if let Some(outcome) = &self.finished {
            return Ok(outcome.clone());
        }

        if self.pages_fetched >= self.max_pages {
            let outcome = PageOutcome::PageLimit {
                pages: self.pages_fetched,
            };
            self.finished = Some(outcome.clone());
            return Ok(outcome);
        }

        let offset = self.cursor.offset;
        let detail_urls = self.fetch_listing(offset).await?;
        self.pages_fetched += 1;

        match detail_urls {
            None => {
                let outcome = PageOutcome::EndOfCatalog { offset };
                self.finished = Some(outcome.clone());
                Ok(outcome)
            }
            Some(detail_urls) => {
                self.cursor = self.cursor.advance();
                Ok(PageOutcome::Items {
                    offset,
                    detail_urls,
                })
            }
        }
    }

    /// Fetches the listing page at `offset`; None when it has no entries
    pub async fn fetch_listing(&self, offset: u64) -> Result<Option<Vec<Url>>, FetchError> {
        let raw = listing_url(&self.template, offset, self.cursor.page_size);
        let url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        tracing::info!("Fetching listing page at offset {}: {}", offset, url);
        let page = self.fetcher.get_page(&url).await?;
        let listing = parse_listing(&page.body, &page.final_url, &self.selectors);

        if listing.is_end_of_catalog() {
            tracing::info!("No items at offset {}, end of catalog", offset);
            return Ok(None);
        }

        tracing::info!(
            "Offset {}: {} items, {} detail links",
            offset,
            listing.item_count,
            listing.detail_urls.len()
        );
        Ok(Some(listing.detail_urls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, ListingConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing_html(hrefs: &[&str]) -> String {
        let items: String = hrefs
            .iter()
            .map(|href| {
                format!(
                    r#"<li class="productlist-item"><a class="mz-productlisting-title" href="{}">x</a></li>"#,
                    href
                )
            })
            .collect();
        format!("<html><body><ul>{}</ul></body></html>", items)
    }

    fn paginator(server: &MockServer, max_pages: u32) -> Paginator {
        let mut http = HttpConfig {
            politeness_delay_ms: 0,
            retry_base_delay_ms: 1,
            ..HttpConfig::default()
        };
        http.headers
            .insert("user-agent".to_string(), "TestHarvester/1.0".to_string());

        let selectors = ListingSelectors::from_config(&ListingConfig {
            item_selector: "li.productlist-item".to_string(),
            link_selector: "a.mz-productlisting-title".to_string(),
            link_attribute: "href".to_string(),
        })
        .unwrap();

        let catalog = CatalogConfig {
            source: "test".to_string(),
            listing_url: format!("{}/list?pageSize={{page_size}}&startIndex={{offset}}", server.uri()),
            page_size: 100,
            start_offset: 0,
            max_pages,
        };

        Paginator::new(Fetcher::from_config(&http).unwrap(), selectors, &catalog)
    }

    async fn mount_page(server: &MockServer, offset: &str, body: String, expected: u64) {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("startIndex", offset))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected)
            .mount(server)
            .await;
    }

    #[test]
    fn test_cursor_advances_by_page_size() {
        let page = CatalogPage {
            offset: 0,
            page_size: 100,
        };
        assert_eq!(page.advance().offset, 100);
        assert_eq!(page.advance().advance().offset, 200);
    }

    #[tokio::test]
    async fn test_stops_at_first_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, "0", listing_html(&["/d/g/1/a", "/d/g/2/b"]), 1).await;
        mount_page(&server, "100", listing_html(&[]), 1).await;
        // never requested
        mount_page(&server, "200", listing_html(&["/d/g/3/c"]), 0).await;

        let mut paginator = paginator(&server, 10);

        match paginator.next_page().await.unwrap() {
            PageOutcome::Items {
                offset,
                detail_urls,
            } => {
                assert_eq!(offset, 0);
                assert_eq!(detail_urls.len(), 2);
                assert!(detail_urls[0].as_str().ends_with("/d/g/1/a"));
            }
            other => panic!("expected items, got {:?}", other),
        }

        assert_eq!(
            paginator.next_page().await.unwrap(),
            PageOutcome::EndOfCatalog { offset: 100 }
        );
        assert!(paginator.is_done());
        assert_eq!(paginator.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn test_end_of_catalog_is_sticky() {
        let server = MockServer::start().await;
        mount_page(&server, "0", listing_html(&[]), 1).await;

        let mut paginator = paginator(&server, 10);
        for _ in 0..3 {
            assert_eq!(
                paginator.next_page().await.unwrap(),
                PageOutcome::EndOfCatalog { offset: 0 }
            );
        }
        assert_eq!(paginator.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn test_page_limit_guard() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["/d/g/1/a"])))
            .expect(2)
            .mount(&server)
            .await;

        let mut paginator = paginator(&server, 2);
        assert!(matches!(
            paginator.next_page().await.unwrap(),
            PageOutcome::Items { offset: 0, .. }
        ));
        assert!(matches!(
            paginator.next_page().await.unwrap(),
            PageOutcome::Items { offset: 100, .. }
        ));
        assert_eq!(
            paginator.next_page().await.unwrap(),
            PageOutcome::PageLimit { pages: 2 }
        );
        assert!(paginator.is_done());
    }

    #[tokio::test]
    async fn test_listing_failure_is_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let mut paginator = paginator(&server, 10);
        let err = paginator.next_page().await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert!(!paginator.is_done());
        assert_eq!(paginator.cursor().offset, 0);
    }

    #[tokio::test]
    async fn test_malformed_listing_ends_catalog() {
        let server = MockServer::start().await;
        mount_page(&server, "0", "<div><p>oops <<<".to_string(), 1).await;

        let mut paginator = paginator(&server, 10);
        assert_eq!(
            paginator.next_page().await.unwrap(),
            PageOutcome::EndOfCatalog { offset: 0 }
        );
    }
}

//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured header set
//! - Per-host politeness delays through the shared [`RateLimiter`]
//! - Retry logic for transient failures
//! - Error classification
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 5xx, 408, 429 | Retry with exponential backoff |
//! | Timeout / connection error | Retry with exponential backoff |
//! | Other HTTP 4xx | Fail immediately |
//! | Invalid URL | Fail immediately |

use crate::config::HttpConfig;
use crate::crawler::limiter::RateLimiter;
use crate::crawler::retry::{RetryDecision, RetryPolicy};
use crate::{ConfigError, FetchError, HarvestError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A successfully fetched text document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

/// Builds an HTTP client sending the configured header set
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - A header was invalid or the client failed to build
pub fn build_http_client(config: &HttpConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::Validation(format!("Invalid value for header '{}'", name)))?;
        headers.insert(header_name, header_value);
    }

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// HTTP GET with politeness delay and retries
///
/// Cloning is cheap: the client and the rate limiter are shared.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher around an existing client
    ///
    /// Callers needing proxies, custom TLS or cookie handling build the
    /// client themselves and pass it in here.
    pub fn new(client: Client, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    /// Creates a fetcher from the HTTP configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(config)?;
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.politeness_delay_ms,
        )));
        Ok(Self::new(client, limiter, RetryPolicy::from_config(config)))
    }

    /// Fetches a text document
    pub async fn get_page(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.get_with_retry(url, |response| async move {
            let final_url = response.url().clone();
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(FetchedPage {
                final_url,
                status,
                body,
            })
        })
        .await
    }

    /// Fetches a binary resource
    pub async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.get_with_retry(url, |response| async move {
            Ok::<_, reqwest::Error>(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn get_with_retry<T, F, Fut>(&self, url: &Url, read: F) -> Result<T, FetchError>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = Result<T, reqwest::Error>>,
    {
        let mut attempt = 1;

        loop {
            let error = match self.get_once(url, &read).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let transient = error.is_transient();
            match self.retry.should_retry(transient, attempt) {
                RetryDecision::Retry { delay } => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.retry.max_attempts(),
                        url,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp if transient => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                RetryDecision::GiveUp => return Err(error),
            }
        }
    }

    async fn get_once<T, F, Fut>(&self, url: &Url, read: &F) -> Result<T, FetchError>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = Result<T, reqwest::Error>>,
    {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        self.limiter.acquire(url).await;
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        read(response).await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> HttpConfig {
        let mut config = HttpConfig {
            politeness_delay_ms: 0,
            retry_base_delay_ms: 1,
            ..HttpConfig::default()
        };
        config
            .headers
            .insert("user-agent".to_string(), "TestHarvester/1.0".to_string());
        config
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = create_test_config();
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            build_http_client(&config),
            Err(HarvestError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "TestHarvester/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::from_config(&create_test_config()).unwrap();
        let page = fetcher.get_page(&url(&server, "/page")).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "hello");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::from_config(&create_test_config()).unwrap();
        let page = fetcher.get_page(&url(&server, "/flaky")).await.unwrap();
        assert_eq!(page.body, "ok");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = Fetcher::from_config(&create_test_config()).unwrap();
        let err = fetcher.get_page(&url(&server, "/down")).await.unwrap_err();
        match err {
            FetchError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, FetchError::Status { status: 500, .. }));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::from_config(&create_test_config()).unwrap();
        let err = fetcher.get_page(&url(&server, "/missing")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_bytes_returns_body_verbatim() {
        let server = MockServer::start().await;
        let body = vec![0xFFu8, 0xD8, 0xFF, 0x00, 0x42];
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let fetcher = Fetcher::from_config(&create_test_config()).unwrap();
        let bytes = fetcher.get_bytes(&url(&server, "/img.jpg")).await.unwrap();
        assert_eq!(bytes, body);
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let fetcher = Fetcher::from_config(&create_test_config()).unwrap();
        let err = fetcher
            .get_bytes(&Url::parse("ftp://example.com/a.jpg").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable that overrides the relational database path
pub const DATABASE_ENV_VAR: &str = "CATALOG_HARVEST_DATABASE";

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub listing: ListingConfig,
    /// Extraction rules keyed by record field name
    pub fields: BTreeMap<String, FieldRule>,
    pub output: OutputConfig,
    #[serde(default)]
    pub relational: Option<RelationalConfig>,
}

/// The catalog listing being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Short source name used in output file names
    pub source: String,

    /// Listing URL template containing `{offset}` and optionally `{page_size}`
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Number of items per listing page; the offset step
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u64,

    /// First offset to request
    #[serde(rename = "start-offset", default)]
    pub start_offset: u64,

    /// Upper bound on listing pages fetched in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,
}

/// HTTP behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Attempts per request, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry (milliseconds)
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Detail pages processed concurrently
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Headers sent with every request; `user-agent` is required
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            politeness_delay_ms: default_politeness_delay_ms(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            workers: default_workers(),
            headers: BTreeMap::new(),
        }
    }
}

/// Selectors used on listing pages
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Matches one product entry on a listing page
    #[serde(rename = "item-selector")]
    pub item_selector: String,

    /// Matches the detail link inside a product entry
    #[serde(rename = "link-selector")]
    pub link_selector: String,

    /// Attribute holding the detail URL
    #[serde(rename = "link-attribute", default = "default_link_attribute")]
    pub link_attribute: String,
}

/// How one record field is read from a detail document
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRule {
    /// CSS selector
    pub selector: String,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,

    /// Collect every text fragment of every match, joined by this separator
    #[serde(default)]
    pub join: Option<String>,

    /// Post-processing applied in order after extraction
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

/// Post-processing step for an extracted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    /// Remove newlines and trim surrounding whitespace
    NormalizeWhitespace,

    /// Turn a protocol-relative or site-relative URL into an absolute one
    HttpsScheme,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the daily CSV file
    pub dir: String,

    /// Directory receiving product images; defaults to `<dir>/images`
    #[serde(rename = "images-dir", default)]
    pub images_dir: Option<String>,
}

impl OutputConfig {
    /// Resolved image directory
    pub fn images_dir(&self) -> PathBuf {
        match &self.images_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&self.dir).join("images"),
        }
    }
}

/// Relational sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelationalConfig {
    /// Path to the SQLite database; `CATALOG_HARVEST_DATABASE` takes precedence
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,

    /// Table the records are appended to
    #[serde(default = "default_table")]
    pub table: String,

    /// Rows per insert batch
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl RelationalConfig {
    /// Resolves the database path from the environment or the config file
    pub fn resolve_database_path(&self) -> Option<PathBuf> {
        std::env::var(DATABASE_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.database_path.clone())
            .map(PathBuf::from)
    }
}

fn default_page_size() -> u64 {
    100
}

fn default_max_pages() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_politeness_delay_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_workers() -> u32 {
    1
}

fn default_link_attribute() -> String {
    "href".to_string()
}

fn default_table() -> String {
    "products".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

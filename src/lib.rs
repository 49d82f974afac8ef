//! Catalog-Harvest: a polite product catalog harvester
//!
//! This crate crawls one paginated catalog listing, extracts a product record
//! from every detail page it links to, stores each product image, and writes
//! the collected records to a CSV file and a SQLite table.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for {field}: '{selector}'")]
    InvalidSelector { field: String, selector: String },
}

/// Errors raised while fetching a resource over HTTP
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Returns true if a retry of the same request may succeed
    ///
    /// Timeouts, connection failures, 408, 429 and 5xx responses are
    /// transient. Invalid URLs and other 4xx responses are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            Self::InvalidUrl { .. } | Self::Exhausted { .. } => false,
        }
    }

    /// The URL this error refers to
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Status { url, .. }
            | Self::Timeout { url }
            | Self::Network { url, .. }
            | Self::Exhausted { url, .. } => url,
        }
    }
}

/// Structural errors that stop a single record from being extracted
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("URL {url} has {found} path segments, at least 3 are needed to derive a category")]
    TooFewSegments { url: String, found: usize },

    #[error("Invalid detail URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("No field selector matched anything in {url}")]
    Unparsable { url: String },
}

/// Errors raised while downloading or storing a product image
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Record {key} has no image URL")]
    MissingUrl { key: String },

    #[error("Record has no id to name the image file after")]
    EmptyKey,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, HarvestRun};
pub use record::{Issue, IssueKind, Record, RecordState};

//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {} items per page", config.catalog.page_size);
//! ```

pub(crate) mod parser;
mod types;
pub(crate) mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, FieldRule, HttpConfig, ListingConfig, OutputConfig, RelationalConfig,
    Transform, DATABASE_ENV_VAR,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

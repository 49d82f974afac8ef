//! URL handling for the catalog crawl
//!
//! This module provides listing URL construction, category derivation from
//! detail URLs, image URL normalization and host keys for rate limiting.

mod category;
mod host;
mod image;
mod listing;

pub use category::{category_from_url, MIN_CATEGORY_SEGMENTS};
pub use host::host_key;
pub use image::normalize_image_url;
pub use listing::{listing_url, OFFSET_PLACEHOLDER, PAGE_SIZE_PLACEHOLDER};

//! Document extraction
//!
//! This module turns fetched HTML into crawl data:
//! - listing pages into detail URLs
//! - detail pages into [`Record`](crate::record::Record)s, driven by a
//!   configured [`ExtractionRuleSet`]

mod extractor;
mod listing;
mod rules;
mod text;

pub use extractor::{extract_from_html, extract_record, Extraction};
pub use listing::{parse_listing, ListingPage, ListingSelectors};
pub use rules::{CompiledRule, ExtractMode, ExtractionRuleSet};
pub use text::normalize_text;

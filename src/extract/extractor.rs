//! Field extraction from product detail pages

use crate::config::Transform;
use crate::extract::rules::{CompiledRule, ExtractMode, ExtractionRuleSet};
use crate::extract::text::normalize_text;
use crate::record::{Field, Record};
use crate::url::{category_from_url, normalize_image_url};
use crate::ExtractError;
use scraper::Html;
use url::Url;

/// A record plus the fields whose selectors matched nothing
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: Record,

    /// Fields stored as empty strings because nothing matched
    pub missing: Vec<Field>,
}

/// Extracts a record from a parsed detail document
///
/// A selector that matches nothing leaves its field empty and extraction
/// carries on with the remaining fields. Extraction fails only when the
/// detail URL is too short to derive the category from, or when no field
/// selector matches anything in the document.
///
/// # Arguments
///
/// * `document` - The parsed detail page
/// * `page_url` - The URL the document was fetched from
/// * `rules` - Compiled extraction rules
pub fn extract_record(
    document: &Html,
    page_url: &Url,
    rules: &ExtractionRuleSet,
) -> Result<Extraction, ExtractError> {
    let item_category = category_from_url(page_url)?;

    let mut missing = Vec::new();
    let mut value_of = |field: Field| -> String {
        match rules.get(field).and_then(|rule| apply_rule(document, rule, page_url)) {
            Some(value) => value,
            None => {
                missing.push(field);
                String::new()
            }
        }
    };

    let record = Record {
        item_id: value_of(Field::ItemId),
        item_name: value_of(Field::ItemName),
        item_category,
        item_description: value_of(Field::ItemDescription),
        item_price: value_of(Field::ItemPrice),
        item_image: value_of(Field::ItemImage),
    };

    if missing.len() == Field::DOCUMENT_FIELDS.len() {
        return Err(ExtractError::Unparsable {
            url: page_url.to_string(),
        });
    }

    Ok(Extraction { record, missing })
}

/// Parses raw HTML and extracts a record from it
pub fn extract_from_html(
    html: &str,
    page_url: &Url,
    rules: &ExtractionRuleSet,
) -> Result<Extraction, ExtractError> {
    let document = Html::parse_document(html);
    extract_record(&document, page_url, rules)
}

/// Runs one rule against the document; None when nothing matched
fn apply_rule(document: &Html, rule: &CompiledRule, page_url: &Url) -> Option<String> {
    let raw = match &rule.mode {
        ExtractMode::Text => {
            let element = document.select(&rule.selector).next()?;
            normalize_text(&element.text().collect::<String>())
        }
        ExtractMode::JoinedText(separator) => {
            let mut matched = false;
            let mut fragments = Vec::new();
            for element in document.select(&rule.selector) {
                matched = true;
                fragments.extend(
                    element
                        .text()
                        .map(normalize_text)
                        .filter(|fragment| !fragment.is_empty()),
                );
            }
            if !matched {
                return None;
            }
            fragments.join(separator)
        }
        ExtractMode::Attribute(name) => {
            let element = document.select(&rule.selector).next()?;
            element.value().attr(name)?.to_string()
        }
    };

    Some(
        rule.transforms
            .iter()
            .fold(raw, |value, transform| match transform {
                Transform::NormalizeWhitespace => normalize_text(&value),
                Transform::HttpsScheme => normalize_image_url(&value, page_url),
            }),
    )
}

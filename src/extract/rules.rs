//! Compiled extraction rules
//!
//! Rules come from the `[fields.*]` tables of the configuration. Compiling
//! them once up front means a bad selector is a config error instead of a
//! failure on every detail page.

use crate::config::{FieldRule, Transform};
use crate::record::Field;
use crate::ConfigError;
use scraper::Selector;
use std::collections::BTreeMap;

/// How a value is read from the matched element(s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractMode {
    /// Text of the first matching element
    Text,

    /// Every text fragment of every matching element, joined by the separator
    JoinedText(String),

    /// Named attribute of the first matching element
    Attribute(String),
}

/// A single field rule with its selector parsed
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub selector: Selector,
    pub mode: ExtractMode,
    pub transforms: Vec<Transform>,
}

impl CompiledRule {
    fn compile(field: Field, rule: &FieldRule) -> Result<Self, ConfigError> {
        let selector = parse_selector(field.as_str(), &rule.selector)?;

        let mode = match (&rule.attribute, &rule.join) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Validation(format!(
                    "{} cannot set both attribute and join",
                    field
                )))
            }
            (Some(attribute), None) if attribute.is_empty() => {
                return Err(ConfigError::Validation(format!(
                    "{} has an empty attribute name",
                    field
                )))
            }
            (Some(attribute), None) => ExtractMode::Attribute(attribute.clone()),
            (None, Some(separator)) => ExtractMode::JoinedText(separator.clone()),
            (None, None) => ExtractMode::Text,
        };

        let mut transforms = rule.transforms.clone();
        // The image column always holds an absolute URL.
        if field == Field::ItemImage && !transforms.contains(&Transform::HttpsScheme) {
            transforms.push(Transform::HttpsScheme);
        }

        Ok(Self {
            selector,
            mode,
            transforms,
        })
    }
}

/// The full set of rules for the document-derived record fields
#[derive(Debug, Clone)]
pub struct ExtractionRuleSet {
    rules: Vec<(Field, CompiledRule)>,
}

impl ExtractionRuleSet {
    /// Compiles the `[fields]` configuration
    ///
    /// Every field in [`Field::DOCUMENT_FIELDS`] needs a rule. Rules are kept
    /// in column order regardless of the order they were written in.
    pub fn from_config(fields: &BTreeMap<String, FieldRule>) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(fields.len());

        for (name, rule) in fields {
            let field = Field::from_name(name).ok_or_else(|| {
                ConfigError::Validation(format!("Unknown field '{}' in [fields]", name))
            })?;

            if field == Field::ItemCategory {
                return Err(ConfigError::Validation(
                    "item_category is derived from the detail URL and cannot have a rule"
                        .to_string(),
                ));
            }

            rules.push((field, CompiledRule::compile(field, rule)?));
        }

        for field in Field::DOCUMENT_FIELDS {
            if !rules.iter().any(|(f, _)| *f == field) {
                return Err(ConfigError::Validation(format!(
                    "Missing extraction rule for {}",
                    field
                )));
            }
        }

        rules.sort_by_key(|(field, _)| *field);

        Ok(Self { rules })
    }

    /// Iterates the rules in column order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &CompiledRule)> {
        self.rules.iter().map(|(field, rule)| (*field, rule))
    }

    /// Returns the rule for one field
    pub fn get(&self, field: Field) -> Option<&CompiledRule> {
        self.iter().find(|(f, _)| *f == field).map(|(_, rule)| rule)
    }
}

/// Parses a CSS selector, naming the field it belongs to on failure
pub(crate) fn parse_selector(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

//! The product record and its fixed column layout

use serde::{Deserialize, Serialize};
use std::fmt;

/// One product harvested from a detail page
///
/// Field order matches the output column order, which is what the CSV
/// writer uses for its header row. A record is built once by the extractor
/// and is only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Site SKU; names the stored image file
    pub item_id: String,

    /// Display title
    pub item_name: String,

    /// Category segment taken from the detail URL path
    pub item_category: String,

    /// Description fragments joined by `"; "`
    pub item_description: String,

    /// Price text exactly as displayed
    pub item_price: String,

    /// Absolute URL of the primary product image
    pub item_image: String,
}

impl Record {
    /// Returns the value stored for a field
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::ItemId => &self.item_id,
            Field::ItemName => &self.item_name,
            Field::ItemCategory => &self.item_category,
            Field::ItemDescription => &self.item_description,
            Field::ItemPrice => &self.item_price,
            Field::ItemImage => &self.item_image,
        }
    }

    /// Returns all six values in column order
    pub fn values(&self) -> [&str; 6] {
        Field::COLUMNS.map(|field| self.value(field))
    }
}

/// A named column of a [`Record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ItemId,
    ItemName,
    ItemCategory,
    ItemDescription,
    ItemPrice,
    ItemImage,
}

impl Field {
    /// Output column order
    pub const COLUMNS: [Field; 6] = [
        Field::ItemId,
        Field::ItemName,
        Field::ItemCategory,
        Field::ItemDescription,
        Field::ItemPrice,
        Field::ItemImage,
    ];

    /// Fields read from the detail document through extraction rules
    ///
    /// `item_category` is absent: it comes from the detail URL.
    pub const DOCUMENT_FIELDS: [Field; 5] = [
        Field::ItemId,
        Field::ItemName,
        Field::ItemDescription,
        Field::ItemPrice,
        Field::ItemImage,
    ];

    /// Column name of this field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ItemId => "item_id",
            Self::ItemName => "item_name",
            Self::ItemCategory => "item_category",
            Self::ItemDescription => "item_description",
            Self::ItemPrice => "item_price",
            Self::ItemImage => "item_image",
        }
    }

    /// Parses a column name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::COLUMNS.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

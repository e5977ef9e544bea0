//! Catalog product records and their search-index projection.
//!
//! [`ProductRecord`] is the row as the catalog database holds it and as HTTP
//! clients see it. [`IndexDocument`] is the flattened, validated copy that is
//! written into the search index under `{key_prefix}{id}`.
//!
//! ```
//! use catalog_search::{IndexDocument, ProductRecord};
//!
//! let record = ProductRecord {
//!     id: 7,
//!     name: "AirPods Pro 2".into(),
//!     description: None,
//!     price: 6_490_000.0,
//!     stock: 100,
//!     image_ref: None,
//!     category_id: 3,
//!     views: 3200,
//!     discount_percent: 12,
//!     created_at: 0,
//!     updated_at: 0,
//! };
//! let doc = IndexDocument::try_from(&record).unwrap();
//! assert_eq!(doc.discount, 12);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::DocField;

/// A product as stored in the catalog database.
///
/// Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    #[serde(rename = "imageUrl", default)]
    pub image_ref: Option<String>,
    pub category_id: i64,
    pub views: i64,
    #[serde(rename = "discount")]
    pub discount_percent: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Record that cannot be projected into the index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("product {id}: price {price} is not a finite non-negative number")]
    InvalidPrice { id: i64, price: f64 },
    #[error("product {id}: {field} must be non-negative, got {value}")]
    Negative {
        id: i64,
        field: &'static str,
        value: i64,
    },
    #[error("product {id}: discount {value} is outside 0..=100")]
    DiscountOutOfRange { id: i64, value: i64 },
}

/// Search-index document for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub category_id: i64,
    pub views: i64,
    pub discount: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&ProductRecord> for IndexDocument {
    type Error = ProjectionError;

    fn try_from(record: &ProductRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        if !record.price.is_finite() || record.price < 0.0 {
            return Err(ProjectionError::InvalidPrice { id, price: record.price });
        }
        for (field, value) in [("stock", record.stock), ("views", record.views)] {
            if value < 0 {
                return Err(ProjectionError::Negative { id, field, value });
            }
        }
        if !(0..=100).contains(&record.discount_percent) {
            return Err(ProjectionError::DiscountOutOfRange {
                id,
                value: record.discount_percent,
            });
        }

        Ok(Self {
            id,
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            stock: record.stock,
            image_ref: record.image_ref.clone(),
            category_id: record.category_id,
            views: record.views,
            discount: record.discount_percent,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl IndexDocument {
    /// Numeric value of a field, `None` for text fields.
    #[must_use]
    pub fn numeric(&self, field: DocField) -> Option<f64> {
        let value = match field {
            DocField::Price => self.price,
            DocField::Stock => self.stock as f64,
            DocField::CategoryId => self.category_id as f64,
            DocField::Views => self.views as f64,
            DocField::Discount => self.discount as f64,
            DocField::CreatedAt => self.created_at as f64,
            DocField::UpdatedAt => self.updated_at as f64,
            DocField::Name | DocField::Description | DocField::ImageRef => return None,
        };
        Some(value)
    }

    /// Text value of a full-text field.
    #[must_use]
    pub fn text(&self, field: DocField) -> Option<&str> {
        match field {
            DocField::Name => Some(&self.name),
            DocField::Description => self.description.as_deref(),
            DocField::ImageRef => self.image_ref.as_deref(),
            _ => None,
        }
    }
}

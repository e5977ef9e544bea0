// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder - typed predicates for product search
//!
//! A [`Query`] is a conjunction of [`Predicate`]s over the indexed
//! [`DocField`]s. An empty query matches every document. Optional filters are
//! expressed as `Option`s and range ends as [`Bound`]s, so a missing filter
//! never turns into a sentinel value on the wire.
//!
//! # Example
//!
//! ```rust
//! use std::ops::Bound;
//! use catalog_search::search::{DocField, Query, QueryBuilder};
//!
//! let query = QueryBuilder::new()
//!     .keyword(Some("iphone pro"))
//!     .term(DocField::CategoryId, Some(1))
//!     .range(DocField::Price, Bound::Included(1_000_000.0), Bound::Unbounded)
//!     .build();
//! assert_eq!(query.predicates.len(), 3);
//!
//! assert!(Query::match_all().is_match_all());
//! ```

use std::ops::Bound;

use serde::{Deserialize, Serialize};

/// Fields of the product index document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocField {
    Name,
    Description,
    Price,
    Stock,
    ImageRef,
    CategoryId,
    Views,
    Discount,
    CreatedAt,
    UpdatedAt,
}

impl DocField {
    /// Field name as stored in the index document.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocField::Name => "name",
            DocField::Description => "description",
            DocField::Price => "price",
            DocField::Stock => "stock",
            DocField::ImageRef => "image_ref",
            DocField::CategoryId => "category_id",
            DocField::Views => "views",
            DocField::Discount => "discount",
            DocField::CreatedAt => "created_at",
            DocField::UpdatedAt => "updated_at",
        }
    }

    /// Fields matched by a keyword search.
    pub const KEYWORD_FIELDS: [DocField; 2] = [DocField::Name, DocField::Description];
}

impl std::fmt::Display for DocField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Any of `terms` appears in any of `fields`.
    FullText { fields: Vec<DocField>, terms: Vec<String> },
    /// Exact numeric match.
    Term { field: DocField, value: i64 },
    /// Numeric range; each end may be open, inclusive or exclusive.
    Range {
        field: DocField,
        min: Bound<f64>,
        max: Bound<f64>,
    },
}

/// Conjunctive search query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub predicates: Vec<Predicate>,
}

impl Query {
    /// Query that matches every document.
    #[must_use]
    pub fn match_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Keyword match over `fields`. Text without searchable terms matches all.
    pub fn full_text(fields: &[DocField], text: &str) -> Self {
        let terms = terms(text);
        if terms.is_empty() {
            return Self::match_all();
        }
        Self::from(Predicate::FullText {
            fields: fields.to_vec(),
            terms,
        })
    }

    pub fn term(field: DocField, value: i64) -> Self {
        Self::from(Predicate::Term { field, value })
    }

    pub fn range(field: DocField, min: Bound<f64>, max: Bound<f64>) -> Self {
        Self::from(Predicate::Range { field, min, max })
    }

    /// Combine with AND
    #[must_use]
    pub fn and(mut self, other: Query) -> Self {
        self.predicates.extend(other.predicates);
        self
    }
}

impl From<Predicate> for Query {
    fn from(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
        }
    }
}

/// Builder that skips absent filters.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword over name and description.
    #[must_use]
    pub fn keyword(mut self, text: Option<&str>) -> Self {
        if let Some(text) = text {
            self.query = self.query.and(Query::full_text(&DocField::KEYWORD_FIELDS, text));
        }
        self
    }

    #[must_use]
    pub fn term(mut self, field: DocField, value: Option<i64>) -> Self {
        if let Some(value) = value {
            self.query = self.query.and(Query::term(field, value));
        }
        self
    }

    /// Range clause; dropped when both ends are open.
    #[must_use]
    pub fn range(mut self, field: DocField, min: Bound<f64>, max: Bound<f64>) -> Self {
        if !matches!((min, max), (Bound::Unbounded, Bound::Unbounded)) {
            self.query = self.query.and(Query::range(field, min, max));
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Query {
        self.query
    }
}

/// Split text into lowercase search terms, dropping punctuation and duplicates.
pub fn terms(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        let token = token.to_lowercase();
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

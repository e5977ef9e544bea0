// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Faceted product search over RediSearch.
//!
//! # Architecture
//!
//! ```text
//! ProductListParams (raw HTTP)
//!     ↓
//! SearchQuery (typed) ──→ Query (predicates) + SortKey + Window
//!     ↓
//!     ├─→ RediSearchTranslator → FT.SEARCH syntax
//!     └─→ in-memory evaluator (storage::memory)
//! ```
//!
//! # Index Registration
//!
//! ```rust
//! use catalog_search::search::product_index;
//!
//! let index = product_index("products", "product:");
//! assert_eq!(index.index_name(), "idx:products");
//! ```

mod index_manager;
mod query_builder;
mod redis_translator;
mod search_query;

pub use index_manager::{product_index, SearchField, SearchFieldType, SearchIndex};
pub use query_builder::{terms, DocField, Predicate, Query, QueryBuilder};
pub use redis_translator::RediSearchTranslator;
pub use search_query::{ProductListParams, SearchQuery, SortKey, SortOrder, Window};

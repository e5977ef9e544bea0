//! In-process search index and catalog.
//!
//! [`InMemorySearchIndex`] mirrors RediSearch semantics closely enough for
//! tests and local runs: documents live under prefixed keys whether or not an
//! index exists, and queries fail with [`StorageError::IndexMissing`] until
//! the index is created. Ties in sort order are broken by ascending id.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::Bound;

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{ProductSource, SearchBackend, StorageError};
use crate::product::{IndexDocument, ProductRecord};
use crate::search::{terms, Predicate, Query, SearchIndex, SortKey, SortOrder, Window};

pub struct InMemorySearchIndex {
    indexes: DashMap<String, SearchIndex>,
    documents: DashMap<String, IndexDocument>,
}

impl InMemorySearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indexes: DashMap::new(),
            documents: DashMap::new(),
        }
    }

    /// Get current document count (all prefixes)
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Stored document for `id`, if any.
    #[must_use]
    pub fn document(&self, index: &SearchIndex, id: i64) -> Option<IndexDocument> {
        self.documents
            .get(&index.document_key(id))
            .map(|r| r.value().clone())
    }

    fn matching(&self, index: &SearchIndex, query: &Query) -> Result<Vec<(IndexDocument, usize)>, StorageError> {
        if !self.indexes.contains_key(&index.index_name()) {
            return Err(StorageError::IndexMissing(index.index_name()));
        }

        Ok(self
            .documents
            .iter()
            .filter(|entry| entry.key().starts_with(&index.prefix))
            .filter_map(|entry| {
                let doc = entry.value();
                score(doc, query).map(|s| (doc.clone(), s))
            })
            .collect())
    }
}

impl Default for InMemorySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Match score of `doc`: `None` if any predicate fails, otherwise the number
/// of keyword terms found.
fn score(doc: &IndexDocument, query: &Query) -> Option<usize> {
    let mut total = 0;
    for predicate in &query.predicates {
        match predicate {
            Predicate::FullText { fields, terms: wanted } => {
                let present: HashSet<String> = fields
                    .iter()
                    .filter_map(|f| doc.text(*f))
                    .flat_map(terms)
                    .collect();
                let hits = wanted.iter().filter(|t| present.contains(*t)).count();
                if hits == 0 {
                    return None;
                }
                total += hits;
            }
            Predicate::Term { field, value } => {
                if doc.numeric(*field) != Some(*value as f64) {
                    return None;
                }
            }
            Predicate::Range { field, min, max } => {
                let v = doc.numeric(*field)?;
                let above = match min {
                    Bound::Included(m) => v >= *m,
                    Bound::Excluded(m) => v > *m,
                    Bound::Unbounded => true,
                };
                let below = match max {
                    Bound::Included(m) => v <= *m,
                    Bound::Excluded(m) => v < *m,
                    Bound::Unbounded => true,
                };
                if !(above && below) {
                    return None;
                }
            }
        }
    }
    Some(total)
}

#[async_trait]
impl SearchBackend for InMemorySearchIndex {
    async fn index_exists(&self, index: &SearchIndex) -> Result<bool, StorageError> {
        Ok(self.indexes.contains_key(&index.index_name()))
    }

    async fn create_index(&self, index: &SearchIndex) -> Result<(), StorageError> {
        // First definition wins, like FT.CREATE.
        self.indexes
            .entry(index.index_name())
            .or_insert_with(|| index.clone());
        Ok(())
    }

    async fn upsert(&self, index: &SearchIndex, doc: &IndexDocument) -> Result<(), StorageError> {
        self.documents.insert(index.document_key(doc.id), doc.clone());
        Ok(())
    }

    async fn delete(&self, index: &SearchIndex, id: i64) -> Result<(), StorageError> {
        self.documents.remove(&index.document_key(id));
        Ok(())
    }

    async fn search_ids(
        &self,
        index: &SearchIndex,
        query: &Query,
        sort: SortKey,
        window: Window,
        cap: usize,
    ) -> Result<Vec<i64>, StorageError> {
        let mut hits = self.matching(index, query)?;

        match sort.order_by() {
            Some((field, order)) => hits.sort_by(|(a, _), (b, _)| {
                let av = a.numeric(field).unwrap_or_default();
                let bv = b.numeric(field).unwrap_or_default();
                let ord = match order {
                    SortOrder::Asc => av.total_cmp(&bv),
                    SortOrder::Desc => bv.total_cmp(&av),
                };
                ord.then(a.id.cmp(&b.id))
            }),
            None => hits.sort_by(|(a, sa), (b, sb)| match sb.cmp(sa) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            }),
        }

        Ok(hits
            .into_iter()
            .skip(window.offset)
            .take(window.limit_or(cap))
            .map(|(doc, _)| doc.id)
            .collect())
    }

    async fn count(&self, index: &SearchIndex, query: &Query) -> Result<u64, StorageError> {
        Ok(self.matching(index, query)?.len() as u64)
    }

    async fn list_ids(&self, index: &SearchIndex) -> Result<Vec<i64>, StorageError> {
        let mut ids: Vec<i64> = self
            .documents
            .iter()
            .filter_map(|entry| index.id_from_key(entry.key()))
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Catalog held in memory, keyed by product id.
pub struct InMemoryCatalog {
    rows: DashMap<i64, ProductRecord>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: DashMap::new() }
    }

    pub fn insert(&self, record: ProductRecord) {
        self.rows.insert(record.id, record);
    }

    pub fn remove(&self, id: i64) -> Option<ProductRecord> {
        self.rows.remove(&id).map(|(_, r)| r)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<ProductRecord> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = ProductRecord>>(iter: I) -> Self {
        let catalog = Self::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}

#[async_trait]
impl ProductSource for InMemoryCatalog {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StorageError> {
        let mut all: Vec<ProductRecord> = self.rows.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<ProductRecord>, StorageError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.rows.get(id).map(|r| r.value().clone()))
            .collect())
    }
}

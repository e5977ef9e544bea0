//! Index Manager
//!
//! Declares the RediSearch index over product JSON documents.
//!
//! # RediSearch Index Creation
//!
//! ```text
//! FT.CREATE idx:products
//!   ON JSON
//!   PREFIX 1 product:
//!   STOPWORDS 0
//!   SCHEMA
//!     $.name AS name TEXT
//!     $.price AS price NUMERIC SORTABLE
//!     $.image_ref AS image_ref TAG
//! ```

use super::query_builder::DocField;

/// Search index definition
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    /// Index name (will be prefixed with "idx:")
    pub name: String,
    /// Key prefix this index covers (e.g., "product:")
    pub prefix: String,
    /// Field definitions for the index
    pub fields: Vec<SearchField>,
    /// Disable the engine's default stopword list
    pub no_stopwords: bool,
}

impl SearchIndex {
    /// Create a new search index definition
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            fields: Vec::new(),
            no_stopwords: false,
        }
    }

    fn field(mut self, name: impl Into<String>, field_type: SearchFieldType, sortable: bool) -> Self {
        self.fields.push(SearchField {
            name: name.into(),
            field_type,
            sortable,
        });
        self
    }

    /// Add a text field
    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, SearchFieldType::Text, false)
    }

    /// Add a numeric field
    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.field(name, SearchFieldType::Numeric, false)
    }

    /// Add a sortable numeric field
    pub fn numeric_sortable(self, name: impl Into<String>) -> Self {
        self.field(name, SearchFieldType::Numeric, true)
    }

    /// Add a tag field (exact, unanalyzed)
    pub fn tag(self, name: impl Into<String>) -> Self {
        self.field(name, SearchFieldType::Tag, false)
    }

    /// Index every word, including common English stopwords.
    pub fn without_stopwords(mut self) -> Self {
        self.no_stopwords = true;
        self
    }

    /// Name the engine knows the index by.
    #[must_use]
    pub fn index_name(&self) -> String {
        format!("idx:{}", self.name)
    }

    /// Storage key of a document.
    #[must_use]
    pub fn document_key(&self, id: i64) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Document id from a storage key, `None` for foreign keys.
    #[must_use]
    pub fn id_from_key(&self, key: &str) -> Option<i64> {
        key.strip_prefix(&self.prefix)?.parse().ok()
    }

    /// Look up a declared field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SearchField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Generate the FT.CREATE command arguments
    pub fn to_ft_create_args(&self) -> Vec<String> {
        let mut args = vec![
            self.index_name(),
            "ON".to_string(),
            "JSON".to_string(),
            "PREFIX".to_string(),
            "1".to_string(),
            self.prefix.clone(),
        ];

        if self.no_stopwords {
            args.push("STOPWORDS".to_string());
            args.push("0".to_string());
        }

        args.push("SCHEMA".to_string());
        for field in &self.fields {
            args.extend(field.to_schema_args());
        }

        args
    }
}

/// Search field definition
#[derive(Debug, Clone, PartialEq)]
pub struct SearchField {
    /// Field name (used in queries)
    pub name: String,
    /// Field type
    pub field_type: SearchFieldType,
    /// Whether the field is sortable
    pub sortable: bool,
}

impl SearchField {
    fn to_schema_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("$.{}", self.name),
            "AS".to_string(),
            self.name.clone(),
            self.field_type.to_string(),
        ];

        if self.sortable {
            args.push("SORTABLE".to_string());
        }

        args
    }
}

/// Search field types supported by RediSearch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFieldType {
    /// Full-text searchable field
    Text,
    /// Numeric field (supports range queries)
    Numeric,
    /// Tag field (exact match)
    Tag,
}

impl std::fmt::Display for SearchFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchFieldType::Text => write!(f, "TEXT"),
            SearchFieldType::Numeric => write!(f, "NUMERIC"),
            SearchFieldType::Tag => write!(f, "TAG"),
        }
    }
}

/// Product index mapping.
///
/// Dates are epoch milliseconds, so they are numeric and sortable like price
/// and views.
pub fn product_index(name: impl Into<String>, prefix: impl Into<String>) -> SearchIndex {
    SearchIndex::new(name, prefix)
        .without_stopwords()
        .text(DocField::Name.as_str())
        .text(DocField::Description.as_str())
        .numeric_sortable(DocField::Price.as_str())
        .numeric(DocField::Stock.as_str())
        .tag(DocField::ImageRef.as_str())
        .numeric(DocField::CategoryId.as_str())
        .numeric_sortable(DocField::Views.as_str())
        .numeric(DocField::Discount.as_str())
        .numeric_sortable(DocField::CreatedAt.as_str())
        .numeric_sortable(DocField::UpdatedAt.as_str())
}

//! RediSearch Translator
//!
//! Translates a [`Query`] to FT.SEARCH syntax.
//!
//! # RediSearch Query Syntax
//!
//! ```text
//! *                               - Match all
//! @name|description:(a|b)         - Any term in any of the fields
//! @category_id:[3 3]              - Numeric equality
//! @price:[1000000 30000000]       - Inclusive range
//! @discount:[(0 +inf]             - Exclusive lower bound
//! query1 query2                   - AND (implicit)
//! ```

use std::ops::Bound;

use super::index_manager::SearchIndex;
use super::query_builder::{Predicate, Query};
use super::search_query::{SortKey, SortOrder, Window};

/// RediSearch query translator
pub struct RediSearchTranslator;

impl RediSearchTranslator {
    /// Translate a query to RediSearch FT.SEARCH syntax
    pub fn translate(query: &Query) -> String {
        if query.is_match_all() {
            return "*".to_string();
        }
        query
            .predicates
            .iter()
            .map(Self::translate_predicate)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arguments for `FT.SEARCH` returning ordered document keys.
    pub fn search_args(index: &SearchIndex, query: &Query, sort: SortKey, window: Window, cap: usize) -> Vec<String> {
        let mut args = vec![index.index_name(), Self::translate(query), "NOCONTENT".to_string()];

        if let Some((field, order)) = sort.order_by() {
            args.push("SORTBY".to_string());
            args.push(field.as_str().to_string());
            args.push(
                match order {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                }
                .to_string(),
            );
        }

        args.extend([
            "LIMIT".to_string(),
            window.offset.to_string(),
            window.limit_or(cap).to_string(),
        ]);
        args.extend(["DIALECT".to_string(), "2".to_string()]);
        args
    }

    /// Arguments for `FT.SEARCH` returning only the total match count.
    pub fn count_args(index: &SearchIndex, query: &Query) -> Vec<String> {
        vec![
            index.index_name(),
            Self::translate(query),
            "NOCONTENT".to_string(),
            "LIMIT".to_string(),
            "0".to_string(),
            "0".to_string(),
            "DIALECT".to_string(),
            "2".to_string(),
        ]
    }

    fn translate_predicate(predicate: &Predicate) -> String {
        match predicate {
            Predicate::FullText { fields, terms } => {
                let fields = fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join("|");
                let terms = terms
                    .iter()
                    .map(|t| Self::escape_value(t))
                    .collect::<Vec<_>>()
                    .join("|");
                format!("@{}:({})", fields, terms)
            }
            Predicate::Term { field, value } => format!("@{}:[{} {}]", field, value, value),
            Predicate::Range { field, min, max } => {
                format!("@{}:[{} {}]", field, Self::bound(min, "-inf"), Self::bound(max, "+inf"))
            }
        }
    }

    fn bound(bound: &Bound<f64>, open: &str) -> String {
        match bound {
            Bound::Included(v) => v.to_string(),
            Bound::Excluded(v) => format!("({}", v),
            Bound::Unbounded => open.to_string(),
        }
    }

    /// Escape RediSearch syntax characters in a single term.
    fn escape_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            if !c.is_alphanumeric() && c != '_' {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

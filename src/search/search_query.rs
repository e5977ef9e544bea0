//! Faceted product query and its translation into a [`Query`].
//!
//! [`ProductListParams`] holds the raw `GET /products` parameters. Parsing is
//! lenient: numbers are read from the leading numeric prefix (`"2abc"` is 2,
//! `"2.5"` as an integer is 2), and empty or non-numeric values behave as if
//! absent.

use std::ops::Bound;

use serde::Deserialize;

use super::query_builder::{DocField, Query, QueryBuilder};

/// Result ordering. Unknown keys fall back to [`SortKey::Newest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    ViewsDesc,
    #[default]
    Newest,
    /// Engine score order; only on explicit request.
    Relevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortKey {
    /// Parse a client sort key, defaulting to newest-first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price_asc") => SortKey::PriceAsc,
            Some("price_desc") => SortKey::PriceDesc,
            Some("views_desc") => SortKey::ViewsDesc,
            Some("relevance") => SortKey::Relevance,
            _ => SortKey::Newest,
        }
    }

    /// Sort field and direction, `None` for relevance order.
    #[must_use]
    pub fn order_by(&self) -> Option<(DocField, SortOrder)> {
        match self {
            SortKey::PriceAsc => Some((DocField::Price, SortOrder::Asc)),
            SortKey::PriceDesc => Some((DocField::Price, SortOrder::Desc)),
            SortKey::ViewsDesc => Some((DocField::Views, SortOrder::Desc)),
            SortKey::Newest => Some((DocField::CreatedAt, SortOrder::Desc)),
            SortKey::Relevance => None,
        }
    }
}

/// Offset/limit window. `limit: None` means "as many as the engine allows".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Window {
    #[must_use]
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-based page.
    #[must_use]
    pub fn page(page: usize, limit: usize) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(limit),
            limit: Some(limit),
        }
    }

    /// Concrete limit, capping an open window at `cap`.
    #[must_use]
    pub fn limit_or(&self, cap: usize) -> usize {
        self.limit.unwrap_or(cap)
    }
}

/// Typed product search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub has_discount: bool,
    pub min_views: Option<i64>,
    pub sort: SortKey,
    pub window: Window,
}

impl SearchQuery {
    /// Build the filter predicate. Sort and window are applied separately.
    pub fn to_query(&self) -> Query {
        let price_min = self.min_price.map_or(Bound::Unbounded, Bound::Included);
        let price_max = self.max_price.map_or(Bound::Unbounded, Bound::Included);
        let discount_min = if self.has_discount {
            Bound::Excluded(0.0)
        } else {
            Bound::Unbounded
        };
        let views_min = self
            .min_views
            .map_or(Bound::Unbounded, |v| Bound::Included(v as f64));

        QueryBuilder::new()
            .keyword(self.keyword.as_deref())
            .term(DocField::CategoryId, self.category_id)
            .range(DocField::Price, price_min, price_max)
            .range(DocField::Discount, discount_min, Bound::Unbounded)
            .range(DocField::Views, views_min, Bound::Unbounded)
            .build()
    }
}

/// Raw `GET /products` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub has_discount: Option<String>,
    pub min_views: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ProductListParams {
    /// 1-based page, defaulting to 1. Zero counts as absent.
    #[must_use]
    pub fn page(&self) -> usize {
        leading_int(&self.page)
            .filter(|&n| n != 0)
            .map_or(1, |n| usize::try_from(n).unwrap_or(1))
    }

    /// Page size, defaulting to `default` and clamped to `1..=max`.
    /// Zero counts as absent.
    #[must_use]
    pub fn limit(&self, default: usize, max: usize) -> usize {
        leading_int(&self.limit)
            .filter(|&n| n != 0)
            .map_or(default, |n| usize::try_from(n).unwrap_or(1))
            .clamp(1, max.max(1))
    }

    /// Search request for the given window.
    #[must_use]
    pub fn to_search_query(&self, window: Window) -> SearchQuery {
        let keyword = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        SearchQuery {
            keyword,
            category_id: leading_int(&self.category_id),
            min_price: leading_float(&self.min_price),
            max_price: leading_float(&self.max_price),
            has_discount: matches!(self.has_discount.as_deref().map(str::trim), Some("true" | "1")),
            min_views: leading_int(&self.min_views),
            sort: SortKey::parse(self.sort.as_deref()),
            window,
        }
    }
}

fn leading_int(raw: &Option<String>) -> Option<i64> {
    let s = raw.as_deref()?.trim_start();
    numeric_prefix(s, false).parse().ok()
}

fn leading_float(raw: &Option<String>) -> Option<f64> {
    let s = raw.as_deref()?.trim_start();
    numeric_prefix(s, true)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Longest prefix of `s` that reads as a decimal number: optional sign, then
/// digits, plus a fraction and exponent when `fraction` is set. Empty when
/// `s` has no leading digit.
fn numeric_prefix(s: &str, fraction: bool) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_from(sign);
    let mut digits = end - sign;

    if fraction && bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if digits > 0 || frac_end > end + 1 {
            digits += frac_end - end - 1;
            end = frac_end;
        }
    }
    if digits == 0 {
        return "";
    }
    if fraction && matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_sign = end + 1 + usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(exp_sign);
        if exp_end > exp_sign {
            end = exp_end;
        }
    }
    &s[..end]
}

//! Paging and ordering of search results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::query::compare_values;

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Which slice of a collection a search returns.
///
/// Pages are 1-indexed. Without `sort_by` documents come back in insertion
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: u32,
    /// Documents per page.
    pub per_page: u32,
    /// Optional document field to order by.
    pub sort_by: Option<String>,
    /// Direction applied to `sort_by` (or to insertion order).
    pub order: SortOrder,
}

impl Pagination {
    /// First page of `per_page` documents in insertion order.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            sort_by: None,
            order: SortOrder::Asc,
        }
    }

    /// A single page holding the whole collection.
    #[must_use]
    pub fn all() -> Self {
        Self::new(1, u32::MAX)
    }

    /// Sets the field to sort by.
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.order = order;
        self
    }

    /// Number of documents to skip.
    #[must_use]
    pub fn offset(&self) -> usize {
        let skipped = u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page);
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }

    /// Maximum number of documents on the page.
    #[must_use]
    pub fn limit(&self) -> usize {
        usize::try_from(self.per_page).unwrap_or(usize::MAX)
    }

    /// Orders and slices documents that are already in insertion order.
    ///
    /// Documents missing the sort field, or holding a value that cannot be
    /// compared, sort after all others regardless of direction.
    #[must_use]
    pub fn apply(&self, mut documents: Vec<Value>) -> SearchHits {
        let total = documents.len() as u64;

        if let Some(field) = &self.sort_by {
            documents.sort_by(|a, b| {
                match (a.get(field.as_str()), b.get(field.as_str())) {
                    (Some(x), Some(y)) => match compare_values(x, y) {
                        Some(ord) if self.order == SortOrder::Desc => ord.reverse(),
                        Some(ord) => ord,
                        None => Ordering::Equal,
                    },
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            });
        } else if self.order == SortOrder::Desc {
            documents.reverse();
        }

        let documents = documents
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect();
        SearchHits { documents, total }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of raw documents plus the size of the full result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Documents on the requested page.
    pub documents: Vec<Value>,
    /// Number of documents matching, across all pages.
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn docs() -> Vec<Value> {
        vec![
            json!({"id": "A1", "n": 3}),
            json!({"id": "A2", "n": 1}),
            json!({"id": "A3"}),
            json!({"id": "A4", "n": 2}),
        ]
    }

    fn ids(hits: &SearchHits) -> Vec<&str> {
        hits.documents
            .iter()
            .filter_map(|d| d.get("id").and_then(Value::as_str))
            .collect()
    }

    #[test]
    fn default_keeps_insertion_order() {
        let hits = Pagination::new(1, 3).apply(docs());
        assert_eq!(hits.total, 4);
        assert_eq!(ids(&hits), vec!["A1", "A2", "A3"]);

        let second = Pagination::new(2, 3).apply(docs());
        assert_eq!(ids(&second), vec!["A4"]);
    }

    #[test]
    fn sorts_by_field_with_missing_last() {
        let asc = Pagination::all().sorted_by("n", SortOrder::Asc).apply(docs());
        assert_eq!(ids(&asc), vec!["A2", "A4", "A1", "A3"]);

        let desc = Pagination::all().sorted_by("n", SortOrder::Desc).apply(docs());
        assert_eq!(ids(&desc), vec!["A1", "A4", "A2", "A3"]);
    }

    #[test]
    fn desc_without_field_reverses_insertion() {
        let mut p = Pagination::new(1, 2);
        p.order = SortOrder::Desc;
        assert_eq!(ids(&p.apply(docs())), vec!["A4", "A3"]);
    }

    #[test]
    fn page_past_end_is_empty() {
        let hits = Pagination::new(9, 10).apply(docs());
        assert!(hits.documents.is_empty());
        assert_eq!(hits.total, 4);
    }

    #[test]
    fn zero_inputs_are_clamped() {
        let p = Pagination::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);
        assert_eq!(p.offset(), 0);
    }
}

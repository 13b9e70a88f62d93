//! Filter → sort → paginate over a full collection
//!
//! Every function here is pure: the collection is borrowed, never modified,
//! and the output only depends on the inputs.

use crate::core::entity::Data;
use crate::core::query::{FilterState, PageRequest, PaginatedResponse, PaginationMeta, SortKey};
use crate::core::store::EntityStore;
use std::cmp::Ordering;

/// Records matching every active predicate of `filter`, in collection order
pub fn filter<'a, T: Data>(records: &'a [T], filter: &FilterState) -> Vec<&'a T> {
    records.iter().filter(|r| matches(*r, filter)).collect()
}

/// Whether `record` passes every active predicate of `filter`
pub fn matches<T: Data>(record: &T, filter: &FilterState) -> bool {
    if let Some(needle) = filter.search_needle() {
        let hit = match &filter.search_fields {
            Some(fields) => fields.iter().any(|f| field_contains(record, f, &needle)),
            None => T::indexed_fields().iter().any(|f| field_contains(record, f, &needle)),
        };
        if !hit {
            return false;
        }
    }

    if let Some(category) = filter.active_category() {
        if record.category() != Some(category) {
            return false;
        }
    }

    if let Some(tag) = filter.active_tag() {
        if !record.tags().iter().any(|t| t == tag) {
            return false;
        }
    }

    if let Some(unit) = filter.active_unit() {
        if !record.unit().is_some_and(|u| u.eq_ignore_ascii_case(unit)) {
            return false;
        }
    }

    if let Some(status) = filter.active_status() {
        if !record.has_status(status) {
            return false;
        }
    }

    filter
        .date_range
        .is_none_or(|range| range.contains(record.occurred_at()))
}

fn field_contains<T: Data>(record: &T, field: &str, needle: &str) -> bool {
    record
        .field_value(field)
        .is_some_and(|value| value.contains_folded(needle))
}

/// Stable sort by `key`; equal records keep their relative order
pub fn sort<T: Data>(records: &mut [&T], key: SortKey) {
    records.sort_by(|a, b| compare(*a, *b, key));
}

fn compare<T: Data>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::Newest => b.occurred_at().cmp(&a.occurred_at()),
        SortKey::Oldest => a.occurred_at().cmp(&b.occurred_at()),
        SortKey::Popular => b.measure().total_cmp(&a.measure()),
        SortKey::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
    }
}

/// Number of pages for `len` items, never less than 1
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// The slice of `items` for `page`; empty beyond the last page
pub fn paginate<X: Clone>(items: &[X], page: PageRequest) -> Vec<X> {
    let start = page.offset();
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page.size()).min(items.len());
    items[start..end].to_vec()
}

/// Full pipeline over `records`.
///
/// Unlike [`paginate`], a page beyond the last is clamped to the last valid
/// page so a shrinking result set never shows an empty screen.
pub fn run_pipeline<'a, T: Data>(
    records: &'a [T],
    state: &FilterState,
    page: PageRequest,
) -> PaginatedResponse<&'a T> {
    let mut matched = filter(records, state);
    if let Some(key) = state.sort {
        sort(&mut matched, key);
    }

    let pagination = PaginationMeta::new(page, matched.len());
    if pagination.was_clamped() {
        tracing::debug!(
            requested = pagination.requested_page,
            page = pagination.page,
            "page clamped to last page"
        );
    }
    let effective = PageRequest {
        page: pagination.page,
        page_size: pagination.page_size,
    };
    let data = paginate(&matched, effective);

    PaginatedResponse { data, pagination }
}

impl<T: Data> EntityStore<T> {
    /// Run the pipeline over this collection, cloning the page out
    pub fn query(&self, state: &FilterState, page: PageRequest) -> PaginatedResponse<T> {
        let response = run_pipeline(self.list(), state, page);
        PaginatedResponse {
            data: response.data.into_iter().cloned().collect(),
            pagination: response.pagination,
        }
    }

    /// Every record matching `state`, sorted, without paging
    pub fn matching(&self, state: &FilterState) -> Vec<&T> {
        let mut matched = filter(self.list(), state);
        if let Some(key) = state.sort {
            sort(&mut matched, key);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityId;
    use crate::core::field::FieldValue;
    use crate::core::query::DateRange;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Article {
        id: EntityId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        title: String,
        body: String,
        category: String,
        tags: Vec<String>,
        views: u64,
    }

    crate::impl_entity!(Article, "articles", "article");

    impl Data for Article {
        fn title(&self) -> &str {
            &self.title
        }

        fn indexed_fields() -> &'static [&'static str] {
            &["title", "body"]
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "title" => Some(self.title.clone().into()),
                "body" => Some(self.body.clone().into()),
                "tags" => Some(FieldValue::List(self.tags.clone())),
                _ => None,
            }
        }

        fn category(&self) -> Option<&str> {
            Some(&self.category)
        }

        fn tags(&self) -> &[String] {
            &self.tags
        }

        fn measure(&self) -> f64 {
            self.views as f64
        }
    }

    fn article(id: EntityId, month: u32, title: &str, category: &str, views: u64) -> Article {
        let at = Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
        Article {
            id,
            created_at: at,
            updated_at: at,
            title: title.to_string(),
            body: format!("body of {}", title.to_lowercase()),
            category: category.to_string(),
            tags: vec![],
            views,
        }
    }

    fn sample() -> Vec<Article> {
        vec![
            article(1, 1, "Borrowing", "A", 5),
            article(2, 2, "async Rust", "A", 9),
            article(3, 3, "Lifetimes", "B", 5),
        ]
    }

    fn ids(records: &[&Article]) -> Vec<EntityId> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_search_returns_collection_in_order() {
        let records = sample();
        let out = filter(&records, &FilterState::default().with_search(""));
        assert_eq!(ids(&out), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_indexed_fields() {
        let records = sample();
        let out = filter(&records, &FilterState::default().with_search("RUST"));
        assert_eq!(ids(&out), vec![2]);

        let out = filter(&records, &FilterState::default().with_search("body of life"));
        assert_eq!(ids(&out), vec![3]);
    }

    #[test]
    fn test_search_fields_override() {
        let records = sample();
        let state = FilterState::default()
            .with_search("body")
            .with_search_fields(&["title"]);
        assert!(filter(&records, &state).is_empty());
    }

    #[test]
    fn test_predicates_are_anded() {
        let records = sample();
        let state = FilterState::default().with_category("A").with_search("borrow");
        assert_eq!(ids(&filter(&records, &state)), vec![1]);

        let state = FilterState::default().with_category("all");
        assert_eq!(filter(&records, &state).len(), 3);
    }

    #[test]
    fn test_date_range_filter() {
        let records = sample();
        let from = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let state = FilterState::default().with_date_range(DateRange::new(Some(from), None));
        assert_eq!(ids(&filter(&records, &state)), vec![2, 3]);
    }

    #[test]
    fn test_category_then_newest() {
        let records = sample();
        let mut out = filter(&records, &FilterState::default().with_category("A"));
        sort(&mut out, SortKey::Newest);
        assert_eq!(ids(&out), vec![2, 1]);
    }

    #[test]
    fn test_popular_sort_is_stable_on_ties() {
        let records = sample();
        let mut out = filter(&records, &FilterState::default());
        sort(&mut out, SortKey::Popular);
        assert_eq!(ids(&out), vec![2, 1, 3]);
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let records = sample();
        let mut out = filter(&records, &FilterState::default());
        sort(&mut out, SortKey::Title);
        assert_eq!(ids(&out), vec![2, 1, 3]);
    }

    #[test]
    fn test_paginate_beyond_last_is_empty() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(&items, PageRequest::new(3, 10)), vec![21, 22, 23, 24, 25]);
        assert!(paginate(&items, PageRequest::new(4, 10)).is_empty());
        assert!(paginate::<u32>(&[], PageRequest::new(1, 10)).is_empty());
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_run_pipeline_clamps_page() {
        let records = sample();
        let response = run_pipeline(&records, &FilterState::default(), PageRequest::new(7, 2));
        assert_eq!(response.pagination.page, 2);
        assert_eq!(response.pagination.total_pages, 2);
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].id, 3);
    }
}

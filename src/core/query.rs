//! Filter state and pagination types

use crate::core::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel meaning "no filter" for equality dimensions
pub const ALL: &str = "all";

/// Page size used when none (or zero) is requested
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on page size
pub const MAX_PAGE_SIZE: usize = 100;

/// The currently active search/category/tag/sort selections.
///
/// All active predicates are ANDed. Empty strings and [`ALL`] disable a
/// dimension, so a default `FilterState` matches everything.
///
/// # Example
/// ```rust,ignore
/// let filter = FilterState::default()
///     .with_search("rust")
///     .with_category("Tutorials")
///     .with_sort(SortKey::Newest);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Free-text query, matched case-insensitively as a substring
    pub search: String,

    /// Fields searched instead of the entity's indexed fields
    pub search_fields: Option<Vec<String>>,

    pub category: Option<String>,

    pub tag: Option<String>,

    /// Unit (currency) equality
    pub unit: Option<String>,

    /// Status equality (published, draft, featured, ...)
    pub status: Option<String>,

    pub date_range: Option<DateRange>,

    /// `None` keeps collection order
    pub sort: Option<SortKey>,
}

impl FilterState {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Lowercased search query, `None` when blank
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    pub fn active_category(&self) -> Option<&str> {
        active(&self.category)
    }

    pub fn active_tag(&self) -> Option<&str> {
        active(&self.tag)
    }

    pub fn active_unit(&self) -> Option<&str> {
        active(&self.unit)
    }

    pub fn active_status(&self) -> Option<&str> {
        active(&self.status)
    }

    /// Whether any predicate would exclude records
    pub fn is_active(&self) -> bool {
        self.search_needle().is_some()
            || self.active_category().is_some()
            || self.active_tag().is_some()
            || self.active_unit().is_some()
            || self.active_status().is_some()
            || self.date_range.is_some_and(|r| !r.is_unbounded())
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

/// Inclusive date bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Named sort orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recent `occurred_at` first
    Newest,
    Oldest,
    /// Highest measure first (views, amount)
    Popular,
    /// Case-insensitive title order
    Title,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::Popular => "popular",
            SortKey::Title => "title",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "date-desc" => Ok(SortKey::Newest),
            "oldest" | "date-asc" => Ok(SortKey::Oldest),
            "popular" | "amount-desc" | "views" => Ok(SortKey::Popular),
            "title" | "name" => Ok(SortKey::Title),
            other => Err(ValidationError::FieldError {
                field: "sort".to_string(),
                message: format!("unknown sort key '{}'", other),
            }),
        }
    }
}

/// A 1-based page request, normalised on construction and deserialization.
///
/// The fields stay public for struct literals; [`PageRequest::offset`] and
/// [`PageRequest::size`] read page 0 as 1 and size 0 as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

/// Page request as it arrives from saved UI state
#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    page_size: usize,
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        PageRequest::new(raw.page, raw.page_size)
    }
}

impl PageRequest {
    /// Page 0 becomes 1, page size 0 becomes [`DEFAULT_PAGE_SIZE`] and sizes
    /// above [`MAX_PAGE_SIZE`] are capped
    pub fn new(page: usize, page_size: usize) -> Self {
        Self::with_limits(page, page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Like [`PageRequest::new`] with configured defaults
    pub fn with_limits(page: usize, page_size: usize, default_size: usize, max_size: usize) -> Self {
        let max_size = max_size.max(1);
        let page_size = if page_size == 0 { default_size } else { page_size };
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_size),
        }
    }

    pub fn first(page_size: usize) -> Self {
        Self::new(1, page_size)
    }

    /// Effective page size, at least 1
    pub fn size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Offset of the first record on this page
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.size())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Paginated response structure
///
/// Wraps one page of records with metadata about the pagination state.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Effective page (after clamping), starts at 1
    pub page: usize,

    /// Page the caller asked for
    pub requested_page: usize,

    pub page_size: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages, at least 1
    pub total_pages: usize,

    pub has_next: bool,

    pub has_prev: bool,
}

impl PaginationMeta {
    /// Metadata for `request` over `total` filtered items, clamping the page
    /// into `1..=total_pages`
    pub fn new(request: PageRequest, total: usize) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = total.div_ceil(page_size).max(1);
        let page = request.page.clamp(1, total_pages);

        Self {
            page,
            requested_page: request.page,
            page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Whether the requested page was out of range and got clamped
    pub fn was_clamped(&self) -> bool {
        self.page != self.requested_page
    }
}

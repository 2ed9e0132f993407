//! List filters and pagination metadata.
//!
//! # Responsibility
//! - Normalize page/page size into LIMIT/OFFSET values.
//! - Build ORDER BY fragments from an allow-list of sortable fields.
//! - Derive page metadata from a total row count.
//!
//! # Invariants
//! - Only fields present in `sort_safe_fields` reach an ORDER BY fragment;
//!   anything else is dropped silently.
//! - Metadata is zero-valued when there are no records.

use serde::Serialize;

/// Page size used for the offset when the requested one is out of range.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Largest page size honored when computing the offset.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sortable post columns; a leading `-` requests descending order.
pub const POST_SORT_SAFE_FIELDS: &[&str] = &[
    "id",
    "-id",
    "title",
    "-title",
    "views",
    "-views",
    "likes",
    "-likes",
    "created_at",
    "-created_at",
    "updated_at",
    "-updated_at",
];

/// Request-scoped list options. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    /// Requested sort fields, e.g. `title` or `-updated_at`.
    pub sort_fields: Vec<String>,
    /// Fields that may appear in `sort_fields`, spelled the same way.
    pub sort_safe_fields: Vec<String>,
}

/// Page metadata returned alongside list results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Filters {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page,
            page_size,
            ..Self::default()
        }
    }

    /// Sets requested sort fields and the allow-list they are checked against.
    pub fn with_sort<S: AsRef<str>>(mut self, fields: &[S], safe_fields: &[&str]) -> Self {
        self.sort_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self.sort_safe_fields = safe_fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Page size actually served; out-of-range sizes fall back to
    /// [`DEFAULT_PAGE_SIZE`].
    pub fn effective_page_size(&self) -> i64 {
        if self.page_size <= 0 || self.page_size > MAX_PAGE_SIZE {
            return DEFAULT_PAGE_SIZE;
        }
        self.page_size
    }

    /// Rows per page; malformed pages fall back to a single row.
    pub fn limit(&self) -> i64 {
        if self.page < 1 {
            return 1;
        }
        self.effective_page_size()
    }

    /// Rows to skip, computed with the effective page size. Saturates
    /// instead of overflowing for huge pages.
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.effective_page_size())
            .max(0)
    }

    /// Builds `field ASC, other DESC` from allowed sort fields.
    ///
    /// Returns an empty string when nothing allowed was requested.
    pub fn sort_field(&self) -> String {
        self.sort_fields
            .iter()
            .filter(|field| self.sort_safe_fields.iter().any(|safe| safe == *field))
            .map(|field| match field.strip_prefix('-') {
                Some(column) => format!("{column} DESC"),
                None => format!("{field} ASC"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// ORDER BY body used by list queries.
    pub(crate) fn order_by(&self) -> String {
        let sort = self.sort_field();
        if sort.is_empty() {
            default_sort().to_string()
        } else {
            sort
        }
    }
}

/// Fallback ordering; listed tables must carry `updated_at`.
pub fn default_sort() -> &'static str {
    "updated_at DESC"
}

/// Derives page metadata from the total record count.
pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records == 0 {
        return Metadata::default();
    }

    let divisor = page_size.max(1);
    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + divisor - 1) / divisor,
        total_records,
    }
}

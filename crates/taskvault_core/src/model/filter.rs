//! List-query filter and pagination options.
//!
//! # Responsibility
//! - Describe pagination, time-range bounds, sort order and archived-row
//!   visibility for list queries.
//!
//! # Invariants
//! - `page` is 1-indexed; offset arithmetic is `(page - 1) * limit`.
//! - `limit` never exceeds [`QueryFilter::MAX_LIMIT`] once applied.
//! - An absent filter means "system defaults, no LIMIT/OFFSET emitted".

use serde::{Deserialize, Serialize};

/// Sort direction over the creation-time column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Returns the SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Immutable pagination/filtering options for list queries.
///
/// Pure data; the query layer reads it, nothing mutates it after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// 1-indexed page number. A value of zero is treated as page 1.
    pub page: u64,
    /// Rows per page. Clamped to [`QueryFilter::MAX_LIMIT`] when applied.
    pub limit: u8,
    /// Sort direction over `created_on`.
    pub sort: SortOrder,
    /// Unix-seconds lower bound on `created_on`.
    pub created_after: Option<u64>,
    /// Unix-seconds upper bound on `created_on`.
    pub created_before: Option<u64>,
    /// Unix-seconds lower bound on `last_updated_on`.
    pub updated_after: Option<u64>,
    /// Unix-seconds upper bound on `last_updated_on`.
    pub updated_before: Option<u64>,
    /// Widens admin-scoped queries to include archived rows. Tenant-scoped
    /// queries ignore this flag and always exclude archived rows.
    pub include_archived: bool,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            sort: SortOrder::default(),
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            include_archived: false,
        }
    }
}

impl QueryFilter {
    /// Rows per page when the caller does not say otherwise.
    pub const DEFAULT_LIMIT: u8 = 20;
    /// Upper bound on rows per page, regardless of caller input.
    pub const MAX_LIMIT: u8 = 250;

    /// Returns a filter for the given page with the default limit.
    pub fn for_page(page: u64) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Returns the page normalized to its 1-indexed floor.
    pub fn normalized_page(&self) -> u64 {
        self.page.max(1)
    }

    /// Returns the limit clamped to the enforced maximum.
    pub fn clamped_limit(&self) -> u8 {
        self.limit.min(Self::MAX_LIMIT)
    }

    /// Returns the OFFSET value implied by page and limit.
    pub fn offset(&self) -> u64 {
        (self.normalized_page() - 1) * u64::from(self.clamped_limit())
    }

    /// Returns whether any time-range bound is set.
    pub fn has_time_bounds(&self) -> bool {
        self.created_after.is_some()
            || self.created_before.is_some()
            || self.updated_after.is_some()
            || self.updated_before.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryFilter, SortOrder};

    #[test]
    fn default_filter_uses_first_page_and_default_limit() {
        let filter = QueryFilter::default();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, QueryFilter::DEFAULT_LIMIT);
        assert_eq!(filter.sort, SortOrder::Ascending);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn offset_follows_page_arithmetic() {
        let filter = QueryFilter {
            page: 10,
            limit: 20,
            ..QueryFilter::default()
        };
        assert_eq!(filter.offset(), 180);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let filter = QueryFilter {
            page: 0,
            ..QueryFilter::default()
        };
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn limit_is_clamped_to_maximum() {
        let filter = QueryFilter {
            limit: u8::MAX,
            ..QueryFilter::default()
        };
        assert_eq!(filter.clamped_limit(), QueryFilter::MAX_LIMIT);
    }
}

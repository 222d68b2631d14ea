//! Behaviour toggles for the normalizer

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Which request parameters the normalizer honors and how page size is bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginateOptions {
    /// Allow `unpaged=true` to return the whole collection
    pub enable_unpaged: bool,
    /// Allow the client to pick a page size
    pub enable_size: bool,
    /// Allow the client to pick the ordering
    pub enable_sort: bool,
    /// Hard cap on page size, used when `max_size` is unset
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    #[validate(range(min = 1, message = "maxSize must be at least 1"))]
    pub max_size: Option<u64>,
    #[validate(range(min = 1, message = "defaultSize must be at least 1"))]
    pub default_size: u64,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        Self {
            enable_unpaged: false,
            enable_size: true,
            enable_sort: true,
            limit: None,
            max_size: None,
            default_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginateOptions {
    /// Upper bound for `size`: `max_size`, else `limit`, else unbounded.
    pub fn size_cap(&self) -> Option<u64> {
        self.max_size.or(self.limit)
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_default_size(mut self, default_size: u64) -> Self {
        self.default_size = default_size;
        self
    }

    pub fn unpaged(mut self, enabled: bool) -> Self {
        self.enable_unpaged = enabled;
        self
    }

    pub fn sizable(mut self, enabled: bool) -> Self {
        self.enable_size = enabled;
        self
    }

    pub fn sortable(mut self, enabled: bool) -> Self {
        self.enable_sort = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PaginateOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_bounds_fail_validation() {
        let errors = PaginateOptions::default().with_max_size(0).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_size"));

        assert!(PaginateOptions::default().with_limit(0).validate().is_err());
        assert!(PaginateOptions::default().with_default_size(0).validate().is_err());
    }

    #[test]
    fn max_size_wins_over_limit() {
        let opts = PaginateOptions::default().with_limit(50).with_max_size(10);
        assert_eq!(opts.size_cap(), Some(10));
        assert_eq!(PaginateOptions::default().with_limit(50).size_cap(), Some(50));
        assert_eq!(PaginateOptions::default().size_cap(), None);
    }
}

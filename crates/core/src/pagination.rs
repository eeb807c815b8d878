//! Page-number pagination used by the list and search endpoints.

use crate::error::CoreError;

/// Page number used when the client omits `page`.
pub const DEFAULT_PAGE: i64 = 1;

/// Items per page used when the client omits `limit`.
pub const DEFAULT_LIMIT: i64 = 5;

/// Upper bound on items per page; larger requests are capped silently.
pub const MAX_LIMIT: i64 = 100;

/// A resolved page window, ready to bind as SQL `LIMIT` / `OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Resolve optional 1-based `page` and `limit` values.
    ///
    /// Values below 1 are rejected; `limit` above [`MAX_LIMIT`] is capped.
    pub fn resolve(page: Option<i64>, limit: Option<i64>) -> Result<Self, CoreError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(CoreError::Validation("page must be at least 1".into()));
        }
        if limit < 1 {
            return Err(CoreError::Validation("limit must be at least 1".into()));
        }

        let limit = limit.min(MAX_LIMIT);
        let offset = (page - 1).saturating_mul(limit);
        Ok(Self { limit, offset })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

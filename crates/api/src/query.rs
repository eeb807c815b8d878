//! Shared query parameter types for API handlers.

use parley_core::error::CoreError;
use parley_core::pagination::Page;
use serde::Deserialize;

/// Pagination parameters (`?page=&limit=`, `Page`/`Limit` also accepted).
///
/// Defaults and bounds are applied by [`Page::resolve`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(alias = "Page")]
    pub page: Option<i64>,
    #[serde(alias = "Limit")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn resolve(&self) -> Result<Page, CoreError> {
        Page::resolve(self.page, self.limit)
    }
}

/// Query parameters for `GET /chats/find`.
///
/// Not `#[serde(flatten)]`ed: flattening breaks numeric query parsing.
#[derive(Debug, Deserialize)]
pub struct ChatSearchParams {
    #[serde(alias = "Q", alias = "title", alias = "Title")]
    pub q: Option<String>,
    #[serde(alias = "Page")]
    pub page: Option<i64>,
    #[serde(alias = "Limit")]
    pub limit: Option<i64>,
}

impl ChatSearchParams {
    pub fn resolve_page(&self) -> Result<Page, CoreError> {
        Page::resolve(self.page, self.limit)
    }
}

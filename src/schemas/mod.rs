pub mod admin;
pub mod campaign;
pub mod user;

pub use admin::*;
pub use campaign::*;
pub use user::*;

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

/// `?skip=&limit=` paging for list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn bounds(&self) -> (u64, u64) {
        page_bounds(self.skip, self.limit)
    }
}

/// Resolve paging parameters to `(offset, limit)` with the limit clamped to 1..=100
pub fn page_bounds(skip: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (
        skip.unwrap_or(0),
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    )
}

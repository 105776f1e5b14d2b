//! Pagination query parameter extractor.

use serde::{Deserialize, Serialize};

use tokengate_core::types::pagination::PageRequest;

/// Query parameters for paginated endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Items per page (default 20, max 100).
    pub limit: Option<i64>,
    /// Items to skip.
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Converts to a `PageRequest`, replacing out-of-range values.
    pub fn into_page_request(self) -> PageRequest {
        PageRequest::new(self.limit, self.offset)
    }
}

//! Pagination configuration.

use serde::{Deserialize, Serialize};

/// Default paging behavior applied when a caller omits the page size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Rows per page when the caller does not ask for a size.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

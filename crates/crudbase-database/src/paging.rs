//! Count-then-fetch paging shared by entity and view-object queries.

use std::future::Future;

use crudbase_core::result::AppResult;
use crudbase_core::types::{PageInfo, PageWindow};

/// Run `count`, then `fetch` one window of rows.
///
/// The fetch is skipped when the window starts past the last row, so a page
/// beyond the end comes back empty with the real total.
pub async fn do_select_page_info<T, C, F>(window: PageWindow, count: C, fetch: F) -> AppResult<PageInfo<T>>
where
    C: Future<Output = AppResult<u64>>,
    F: Future<Output = AppResult<Vec<T>>>,
{
    let total = count.await?;
    let list = if window.offset() >= total {
        Vec::new()
    } else {
        fetch.await?
    };
    Ok(PageInfo::new(list, window, total))
}

//! Hand-written queries whose rows are not entities.

use async_trait::async_trait;
use serde::Serialize;

use crate::result::AppResult;
use crate::types::pagination::PageWindow;

/// A (typically multi-table) query producing view-object rows.
///
/// The repository applies the caller's paging flags: it counts with
/// [`count`](VoQuery::count) and fetches one window, or fetches everything
/// with `window = None`.
#[async_trait]
pub trait VoQuery<P>: Send + Sync
where
    P: Send + Sync,
{
    /// The row type returned by the query.
    type Row: Serialize + Send + Sync + 'static;

    /// Fetch the rows, optionally restricted to a window.
    async fn fetch(&self, param: &P, window: Option<PageWindow>) -> AppResult<Vec<Self::Row>>;

    /// Count all rows the query would return.
    async fn count(&self, param: &P) -> AppResult<u64>;

    /// Name reported as the row type of a page.
    fn row_type(&self) -> &'static str {
        std::any::type_name::<Self::Row>()
    }
}

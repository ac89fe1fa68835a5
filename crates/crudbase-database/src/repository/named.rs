//! Multi-table queries producing view-object pages.
//!
//! A [`VoQuery`] can be run directly, or registered under a name in a
//! [`NamedQueries`] registry and resolved at call time. Registered queries
//! return their rows as JSON so queries with different row types can share
//! one registry.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::error;

use crudbase_core::error::{AppError, ErrorKind};
use crudbase_core::messages;
use crudbase_core::result::AppResult;
use crudbase_core::traits::{BulkDao, Dao, VoQuery};
use crudbase_core::types::{PagePlan, PageQuery, PageResult, PageWindow};
use crudbase_entity::Entity;

use super::BaseRepository;
use crate::paging::do_select_page_info;

type JsonQuery<P> = dyn VoQuery<P, Row = serde_json::Value>;

/// Queries taking parameters `P`, looked up by name.
pub struct NamedQueries<P: Send + Sync> {
    queries: HashMap<String, Box<JsonQuery<P>>>,
}

impl<P: Send + Sync> Default for NamedQueries<P> {
    fn default() -> Self {
        Self {
            queries: HashMap::new(),
        }
    }
}

impl<P: Send + Sync> std::fmt::Debug for NamedQueries<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedQueries")
            .field("names", &self.names())
            .finish()
    }
}

impl<P: Send + Sync + 'static> NamedQueries<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `query` under `name`, replacing any query of that name.
    pub fn register<Q>(&mut self, name: impl Into<String>, query: Q) -> &mut Self
    where
        Q: VoQuery<P> + 'static,
    {
        self.queries.insert(name.into(), Box::new(JsonRows(query)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&JsonQuery<P>> {
        self.queries.get(name).map(|q| q.as_ref())
    }
}

impl<P: Send + Sync> NamedQueries<P> {
    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Serializes the rows of the wrapped query to JSON.
struct JsonRows<Q>(Q);

#[async_trait]
impl<P, Q> VoQuery<P> for JsonRows<Q>
where
    P: Send + Sync,
    Q: VoQuery<P>,
{
    type Row = serde_json::Value;

    async fn fetch(&self, param: &P, window: Option<PageWindow>) -> AppResult<Vec<Self::Row>> {
        self.0
            .fetch(param, window)
            .await?
            .into_iter()
            .map(|row| serde_json::to_value(row).map_err(AppError::from))
            .collect()
    }

    async fn count(&self, param: &P) -> AppResult<u64> {
        self.0.count(param).await
    }

    fn row_type(&self) -> &'static str {
        self.0.row_type()
    }
}

impl<E, S> BaseRepository<E, S>
where
    E: Entity,
    S: Dao<E> + BulkDao<E>,
{
    /// Run a view-object query with the caller's paging flags.
    ///
    /// With the total flag set on a paged query, every row is attached as
    /// `all` as well. Any failure surfaces as a query error.
    pub async fn select_vo_page<P, Q>(
        &self,
        query: &Q,
        param: &P,
        page: &PageQuery,
    ) -> AppResult<PageResult<Q::Row>>
    where
        P: Send + Sync,
        Q: VoQuery<P> + ?Sized,
    {
        self.vo_page(query, param, page).await.map_err(|err| {
            error!(row_type = query.row_type(), error = %err, "View query failed");
            query_failed(err)
        })
    }

    /// Resolve `name` in the registry and run it like
    /// [`select_vo_page`](Self::select_vo_page).
    pub async fn select_vo_page_by_name<P>(
        &self,
        registry: &NamedQueries<P>,
        name: &str,
        param: &P,
        page: &PageQuery,
    ) -> AppResult<PageResult<serde_json::Value>>
    where
        P: Send + Sync + 'static,
    {
        let Some(query) = registry.get(name) else {
            error!(name, "Named query is not registered");
            return Err(AppError::query(messages::QUERY_FAILED));
        };
        self.vo_page(query, param, page).await.map_err(|err| {
            error!(name, error = %err, "Named query failed");
            query_failed(err)
        })
    }

    async fn vo_page<P, Q>(
        &self,
        query: &Q,
        param: &P,
        page: &PageQuery,
    ) -> AppResult<PageResult<Q::Row>>
    where
        P: Send + Sync,
        Q: VoQuery<P> + ?Sized,
    {
        let result = match page.plan(self.page.page_size) {
            PagePlan::Paged(window) => {
                let info = do_select_page_info(
                    window,
                    query.count(param),
                    query.fetch(param, Some(window)),
                )
                .await?;
                let result = PageResult::from_page(info);
                if page.wants_total() {
                    result.with_all(query.fetch(param, None).await?)
                } else {
                    result
                }
            }
            PagePlan::Unpaged => PageResult::from_rows(query.fetch(param, None).await?),
        };
        Ok(result.with_class(query.row_type()).with_draw(page.draw))
    }
}

fn query_failed(err: AppError) -> AppError {
    AppError::with_source(ErrorKind::Query, messages::QUERY_FAILED, err)
}

//! Paged entity selects.

use crudbase_core::result::AppResult;
use crudbase_core::traits::{BulkDao, Dao};
use crudbase_core::types::{Example, PagePlan, PageQuery, PageResult};
use crudbase_entity::Entity;

use super::BaseRepository;
use crate::paging::do_select_page_info;

impl<E, S> BaseRepository<E, S>
where
    E: Entity,
    S: Dao<E> + BulkDao<E>,
{
    /// One page of the live rows matching the example.
    ///
    /// The live predicate is ANDed into every group.
    pub async fn select_page_by_example(
        &self,
        example: Example,
        page: &PageQuery,
    ) -> AppResult<PageResult<E>> {
        let example = Self::live(example)?;
        self.page_of(example, page).await
    }

    /// Like [`select_page_by_example`](Self::select_page_by_example), with
    /// the live predicate applied once around the whole disjunction.
    pub async fn select_page_by_example_outer_live(
        &self,
        mut example: Example,
        page: &PageQuery,
    ) -> AppResult<PageResult<E>> {
        E::meta().check_example(&example)?;
        example.and_live_outside();
        self.page_of(example, page).await
    }

    async fn page_of(&self, example: Example, page: &PageQuery) -> AppResult<PageResult<E>> {
        let result = match page.plan(self.page.page_size) {
            PagePlan::Paged(window) => {
                let info = do_select_page_info(
                    window,
                    self.store.count_by_example(&example),
                    self.store.select_by_example(&example, Some(window)),
                )
                .await?;
                PageResult::from_page(info)
            }
            PagePlan::Unpaged => {
                PageResult::from_rows(self.store.select_by_example(&example, None).await?)
            }
        };
        Ok(result.with_class(E::type_name()).with_draw(page.draw))
    }
}

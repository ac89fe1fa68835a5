//! Pagination value objects exchanged with callers.

use serde::{Deserialize, Serialize};

use crate::types::flags::{PageFlag, TotalFlag};

/// A page window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Page number (1-based).
    pub page: u64,
    /// Number of rows per page.
    pub page_size: u64,
}

impl PageWindow {
    /// Create a window; the page and size are at least 1.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Calculate the SQL `OFFSET` value, capped at `i64::MAX` so it always
    /// binds as a `BIGINT`.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// How a [`PageQuery`] asks for its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePlan {
    /// Count, then fetch one window.
    Paged(PageWindow),
    /// Fetch everything.
    Unpaged,
}

/// Paging parameters sent by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Requested page (1-based); defaults to the first page.
    #[serde(default)]
    pub current_page: Option<u64>,
    /// Requested page size; defaults to the configured size.
    #[serde(default)]
    pub page_size: Option<u64>,
    /// Page or return everything; absent means page.
    #[serde(default)]
    pub page_flag: Option<PageFlag>,
    /// Attach the unpaged rows for a total line.
    #[serde(default)]
    pub total_flag: Option<TotalFlag>,
    /// Row cap of a spreadsheet export. Forces page 1 of this size.
    #[serde(default)]
    pub excel_data_max: Option<u64>,
    /// Opaque token echoed back to the UI.
    #[serde(default)]
    pub draw: Option<i64>,
}

impl PageQuery {
    /// A query for one page of the given size.
    pub fn page(current_page: u64, page_size: u64) -> Self {
        Self {
            current_page: Some(current_page),
            page_size: Some(page_size),
            page_flag: Some(PageFlag::Page),
            ..Self::default()
        }
    }

    /// A query for the whole result set.
    pub fn unpaged() -> Self {
        Self {
            page_flag: Some(PageFlag::NoPage),
            ..Self::default()
        }
    }

    /// Resolve the flags into a plan.
    ///
    /// An export cap wins over every other flag and pins the window to the
    /// first page of `excel_data_max` rows.
    pub fn plan(&self, default_page_size: u64) -> PagePlan {
        if let Some(max) = self.excel_data_max {
            return PagePlan::Paged(PageWindow::new(1, max));
        }
        match self.page_flag {
            None | Some(PageFlag::Page) => PagePlan::Paged(PageWindow::new(
                self.current_page.unwrap_or(1),
                self.page_size.unwrap_or(default_page_size),
            )),
            Some(PageFlag::NoPage) => PagePlan::Unpaged,
        }
    }

    /// Whether the caller asked for the unpaged rows as well.
    pub fn wants_total(&self) -> bool {
        self.total_flag == Some(TotalFlag::Total)
    }
}

/// One fetched page plus the figures needed to render a pager.
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo<T> {
    /// Rows of the page.
    pub list: Vec<T>,
    /// Total rows across all pages.
    pub total: u64,
    /// Page number (1-based).
    pub page_num: u64,
    /// Rows per page.
    pub page_size: u64,
    /// Number of pages.
    pub pages: u64,
}

impl<T> PageInfo<T> {
    pub fn new(list: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            list,
            total,
            page_num: window.page,
            page_size: window.page_size,
            pages: total.div_ceil(window.page_size),
        }
    }
}

/// Paged result returned to a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Rows of this page (or all rows when unpaged).
    pub data: Vec<T>,
    /// Total rows before filtering.
    pub records_total: u64,
    /// Total rows after filtering.
    pub records_filtered: u64,
    /// Total rows.
    pub total: u64,
    /// Page number (1-based).
    pub page_num: u64,
    /// Rows per page.
    pub page_size: u64,
    /// Number of pages.
    pub pages: u64,
    /// Type name of the rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clazz: Option<String>,
    /// Token echoed from the query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw: Option<i64>,
    /// Every row, when a total line was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<T>>,
}

impl<T> PageResult<T> {
    /// Wrap a fetched page.
    pub fn from_page(info: PageInfo<T>) -> Self {
        Self {
            data: info.list,
            records_total: info.total,
            records_filtered: info.total,
            total: info.total,
            page_num: info.page_num,
            page_size: info.page_size,
            pages: info.pages,
            clazz: None,
            draw: None,
            all: None,
        }
    }

    /// Wrap an unpaged result set; the total is the row count.
    pub fn from_rows(rows: Vec<T>) -> Self {
        let total = rows.len() as u64;
        Self {
            data: rows,
            records_total: total,
            records_filtered: total,
            total,
            page_num: 1,
            page_size: total,
            pages: u64::from(total > 0),
            clazz: None,
            draw: None,
            all: None,
        }
    }

    pub fn with_class(mut self, clazz: impl Into<String>) -> Self {
        self.clazz = Some(clazz.into());
        self
    }

    pub fn with_draw(mut self, draw: Option<i64>) -> Self {
        self.draw = draw;
        self
    }

    pub fn with_all(mut self, all: Vec<T>) -> Self {
        self.all = Some(all);
        self
    }
}

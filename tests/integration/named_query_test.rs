//! Integration tests for multi-table view queries.

use async_trait::async_trait;
use serde::Serialize;

use crudbase_core::error::ErrorKind;
use crudbase_core::messages;
use crudbase_core::result::AppResult;
use crudbase_core::traits::VoQuery;
use crudbase_core::types::{Example, PageQuery, PageWindow, SortDirection, TotalFlag};
use crudbase_database::NamedQueries;

use crate::helpers::{Product, ProductRepository, SupplierRepository, stocked, suppliers};

/// Filter of the stock report.
struct StockFilter {
    min_stock: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockLine {
    sku: String,
    stock: i64,
    supplier: Option<String>,
}

/// Live products joined with their live supplier.
struct StockReport {
    products: ProductRepository,
    suppliers: SupplierRepository,
}

impl StockReport {
    async fn lines(&self, filter: &StockFilter) -> AppResult<Vec<StockLine>> {
        let mut example = Example::new();
        example
            .create_criteria()
            .and_greater_than_or_equal_to("stock", filter.min_stock);
        example.order_by("sku", SortDirection::Asc);

        let suppliers = self.suppliers.select_all().await?;
        let products: Vec<Product> = self.products.select_list_by_example(example).await?;
        Ok(products
            .into_iter()
            .map(|p| StockLine {
                supplier: suppliers
                    .iter()
                    .find(|s| s.id.is_some() && s.id == p.supplier_id)
                    .and_then(|s| s.name.clone()),
                sku: p.sku.unwrap_or_default(),
                stock: p.stock.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl VoQuery<StockFilter> for StockReport {
    type Row = StockLine;

    async fn fetch(&self, filter: &StockFilter, window: Option<PageWindow>) -> AppResult<Vec<StockLine>> {
        let lines = self.lines(filter).await?;
        Ok(match window {
            Some(w) => lines
                .into_iter()
                .skip(w.offset() as usize)
                .take(w.limit() as usize)
                .collect(),
            None => lines,
        })
    }

    async fn count(&self, filter: &StockFilter) -> AppResult<u64> {
        Ok(self.lines(filter).await?.len() as u64)
    }

    fn row_type(&self) -> &'static str {
        "StockLine"
    }
}

async fn report() -> (ProductRepository, StockReport) {
    let products = stocked(5).await;
    let suppliers = suppliers(&["Acme", "Globex"]).await;

    let mut assigned = products.select_all().await.unwrap();
    for (i, p) in assigned.iter_mut().enumerate() {
        p.supplier_id = Some(if i % 2 == 0 { 1 } else { 2 });
    }
    products
        .update_by_primary_key_selective_list(&assigned, false)
        .await
        .unwrap();

    let report = StockReport {
        products: products.clone(),
        suppliers,
    };
    (products, report)
}

#[tokio::test]
async fn test_vo_page_joins_tables() {
    let (repo, report) = report().await;
    let page = repo
        .select_vo_page(&report, &StockFilter { min_stock: 2 }, &PageQuery::page(1, 2))
        .await
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(page.pages, 2);
    assert_eq!(page.data[0].sku, "A-2");
    assert_eq!(page.data[0].supplier.as_deref(), Some("Globex"));
    assert_eq!(page.data[1].supplier.as_deref(), Some("Acme"));
    assert_eq!(page.clazz.as_deref(), Some("StockLine"));
}

#[tokio::test]
async fn test_named_query_with_total_rows() {
    let (repo, report) = report().await;
    let mut registry = NamedQueries::new();
    registry.register("stock_report", report);

    let query = PageQuery {
        total_flag: Some(TotalFlag::Total),
        ..PageQuery::page(2, 2)
    };
    let page = repo
        .select_vo_page_by_name(&registry, "stock_report", &StockFilter { min_stock: 0 }, &query)
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0]["sku"], "A-3");
    assert_eq!(page.all.as_ref().map(Vec::len), Some(5));

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["pageNum"], 2);
    assert_eq!(json["clazz"], "StockLine");
    assert!(json["all"].is_array());
}

#[tokio::test]
async fn test_unknown_named_query() {
    let (repo, _) = report().await;
    let registry: NamedQueries<StockFilter> = NamedQueries::new();
    let err = repo
        .select_vo_page_by_name(&registry, "nope", &StockFilter { min_stock: 0 }, &PageQuery::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Query);
    assert_eq!(err.message, messages::QUERY_FAILED);
}

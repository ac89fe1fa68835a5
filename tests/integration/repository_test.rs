//! Integration tests for the generic repository over the in-memory store.

use chrono::{Duration, Utc};

use crudbase_core::error::ErrorKind;
use crudbase_core::messages;
use crudbase_core::types::{Example, PageQuery, SortDirection, Value};
use crudbase_entity::Entity;

use crate::helpers::{Product, product_repository, stocked};

fn by_sku(sku: &str) -> Example {
    let mut example = Example::new();
    example.create_criteria().and_equal_to("sku", sku);
    example
}

#[tokio::test]
async fn test_insert_and_select_by_primary_key() {
    let repo = product_repository();
    assert_eq!(repo.insert(&Product::new("B-1", "Bolt", 0.5, 100)).await.unwrap(), 1);
    assert_eq!(
        repo.insert_selective(&Product::new("B-2", "Nut", 0.2, 300))
            .await
            .unwrap(),
        1
    );

    let nut = repo.select_by_primary_key(&Value::Int(2)).await.unwrap().unwrap();
    assert_eq!(nut.name.as_deref(), Some("Nut"));
    assert!(!nut.is_deleted());
}

#[tokio::test]
async fn test_reads_never_return_soft_deleted_rows() {
    let repo = stocked(4).await;
    let first = repo.select_one_by_example(by_sku("A-1")).await.unwrap().unwrap();
    repo.delete_logical(&first).await.unwrap();

    assert!(repo.select_by_primary_key(&Value::Int(1)).await.unwrap().is_none());
    assert_eq!(repo.select_all().await.unwrap().len(), 3);
    assert!(repo.select_one_by_example(by_sku("A-1")).await.unwrap().is_none());

    let mut example = Example::new();
    example.create_criteria().and_less_than("price", 25.0);
    example.create_criteria().and_equal_to("sku", "A-4");
    let found = repo.select_list_by_example(example).await.unwrap();
    let skus: Vec<_> = found.iter().filter_map(|p| p.sku.as_deref()).collect();
    assert_eq!(skus, vec!["A-2", "A-4"]);
}

#[tokio::test]
async fn test_exclusive_update_round_trip() {
    let repo = stocked(2).await;
    let mut product = repo.select_one_by_example(by_sku("A-2")).await.unwrap().unwrap();
    let observed = product.base.update_time;

    product.base.update_last_time = observed;
    product.stock = Some(0);
    assert_eq!(
        repo.update_by_primary_key_selective_exclusive(&product)
            .await
            .unwrap(),
        1
    );

    // A second writer still holding the first timestamp loses.
    let mut late = product.clone();
    late.base.update_last_time = observed;
    late.stock = Some(9);
    let err = repo
        .update_by_primary_key_selective_exclusive(&late)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let stored = repo.select_by_primary_key(&Value::Int(2)).await.unwrap().unwrap();
    assert_eq!(stored.stock, Some(0));
}

#[tokio::test]
async fn test_exclusive_update_rejects_second_writer_of_same_load() {
    let repo = stocked(1).await;
    let mut w1 = repo.select_by_primary_key(&Value::Int(1)).await.unwrap().unwrap();
    let mut w2 = w1.clone();

    w1.base.update_last_time = w1.base.update_time;
    w1.stock = Some(100);
    w2.base.update_last_time = w2.base.update_time;
    w2.stock = Some(200);

    assert_eq!(repo.update_by_primary_key_selective_exclusive(&w1).await.unwrap(), 1);
    let err = repo
        .update_by_primary_key_selective_exclusive(&w2)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.message, messages::EXCLUSIVE_CONFLICT);

    let stored = repo.select_by_primary_key(&Value::Int(1)).await.unwrap().unwrap();
    assert_eq!(stored.stock, Some(100));
}

#[tokio::test]
async fn test_exclusive_update_of_soft_deleted_row_is_not_found() {
    let repo = stocked(1).await;
    let mut product = repo.select_by_primary_key(&Value::Int(1)).await.unwrap().unwrap();
    repo.delete_logical(&product).await.unwrap();

    product.base.update_last_time = product.base.update_time;
    let err = repo
        .update_by_example_exclusive(&product, by_sku("A-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, messages::EXCLUSIVE_TARGET_MISSING);
}

#[tokio::test]
async fn test_exclusive_update_accepts_sub_millisecond_drift() {
    let repo = stocked(1).await;
    let mut product = repo.select_by_primary_key(&Value::Int(1)).await.unwrap().unwrap();
    let observed = product.base.update_time.unwrap();
    product.base.update_last_time = Some(observed + Duration::microseconds(400));
    product.base.update_time = None;
    product.name = Some("Renamed".into());

    assert_eq!(
        repo.update_by_example_selective_exclusive(&product, by_sku("A-1"))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_mutations_reject_missing_values() {
    let repo = stocked(2).await;
    let patch = Product {
        name: Some("x".into()),
        ..Product::default()
    };

    let mut empty_list = Example::new();
    empty_list.create_criteria().and_in("id", Vec::<i64>::new());
    let mut empty_bytes = Example::new();
    empty_bytes.create_criteria().and_equal_to("sku", Vec::<u8>::new());

    for example in [by_sku(""), empty_list, empty_bytes] {
        let err = repo
            .update_by_example_selective(&patch, example)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, messages::CRITERION_VALUE_NOT_EXIST);
    }

    let mut null_check = Example::new();
    null_check.create_criteria().and_is_null("supplier_id");
    assert_eq!(
        repo.update_by_example_selective(&patch, null_check)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_selective_update_needs_a_column() {
    let repo = stocked(1).await;
    let empty = Product {
        id: Some(1),
        ..Product::default()
    };
    let err = repo.update_by_primary_key_selective(&empty).await.unwrap_err();
    assert_eq!(err.message, messages::NOTHING_TO_UPDATE);
}

#[tokio::test]
async fn test_list_updates() {
    let repo = stocked(3).await;
    let mut products = repo.select_all().await.unwrap();
    for p in &mut products {
        p.price = p.price.map(|v| v * 2.0);
    }
    assert_eq!(repo.update_by_primary_key_list(&products, false).await.unwrap(), 3);

    let third = repo.select_by_primary_key(&Value::Int(3)).await.unwrap().unwrap();
    assert_eq!(third.price, Some(60.0));
    assert_eq!(repo.update_by_primary_key_list(&[], true).await.unwrap(), 0);
}

#[tokio::test]
async fn test_logical_delete_by_example_and_ids() {
    let repo = stocked(5).await;
    let mut template = Product::default();
    template.base.touched("remover", Utc::now());

    let mut cheap = Example::new();
    cheap.create_criteria().and_less_than_or_equal_to("price", 20.0);
    assert_eq!(repo.delete_logical_by_example(&template, cheap).await.unwrap(), 2);

    assert_eq!(
        repo.delete_logical_by_ids(&template, &[Value::Int(2), Value::Int(3)])
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        repo.delete_logical_by_ids_on(&template, "sku", &[Value::from("A-5")])
            .await
            .unwrap(),
        1
    );

    let live = repo.select_all().await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].sku.as_deref(), Some("A-4"));

    let rows = repo.store().rows().await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].base.update_user.as_deref(), Some("remover"));
}

#[tokio::test]
async fn test_physical_delete() {
    let repo = stocked(3).await;
    let first = repo.select_by_primary_key(&Value::Int(1)).await.unwrap().unwrap();
    assert_eq!(repo.delete_physical(&first).await.unwrap(), 1);
    assert_eq!(
        repo.delete_physical_by_ids(&[Value::Int(2), Value::Int(3), Value::Int(4)])
            .await
            .unwrap(),
        2
    );
    assert!(repo.store().rows().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_paged_select_with_ordering() {
    let repo = stocked(7).await;
    let mut example = Example::new();
    example.order_by("price", SortDirection::Desc);

    let page = repo
        .select_page_by_example(example, &PageQuery::page(2, 3))
        .await
        .unwrap();
    assert_eq!(page.total, 7);
    assert_eq!(page.pages, 3);
    let skus: Vec<_> = page.data.iter().filter_map(|p| p.sku.as_deref()).collect();
    assert_eq!(skus, vec!["A-4", "A-3", "A-2"]);
    assert_eq!(page.clazz.as_deref(), Some(Product::type_name()));
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let repo = stocked(2).await;
    let page = repo
        .select_page_by_example(Example::new(), &PageQuery::page(5, 10))
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let repo = stocked(1).await;

    let tx = repo.begin().await.unwrap();
    tx.insert(&Product::new("T-1", "Kept", 1.0, 1)).await.unwrap();
    tx.commit().await.unwrap();

    let tx = repo.begin().await.unwrap();
    tx.insert(&Product::new("T-2", "Dropped", 1.0, 1)).await.unwrap();
    tx.rollback().await.unwrap();

    let skus: Vec<_> = repo
        .select_all()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|p| p.sku)
        .collect();
    assert_eq!(skus, vec!["A-1", "T-1"]);
}

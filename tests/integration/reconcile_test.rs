//! Integration tests for list reconciliation.

use crudbase_core::error::ErrorKind;
use crudbase_core::types::Value;
use crudbase_database::ReconcileOutcome;

use crate::helpers::{Product, product_repository};

#[tokio::test]
async fn test_reconcile_inserts_updates_and_deletes() {
    let repo = product_repository();
    repo.insert_list(&[
        Product::new("A", "Old A", 1.0, 1),
        Product::new("B", "Old B", 2.0, 2),
        Product::new("C", "Old C", 3.0, 3),
    ])
    .await
    .unwrap();
    repo.delete_physical_by_ids(&[Value::Int(1)]).await.unwrap();
    let previous = repo.select_all().await.unwrap();

    let mut b = previous[0].clone();
    b.name = Some("New B".into());
    let a = Product::new("A", "New A", 1.5, 4);

    let outcome = repo
        .reconcile(&[a, b], &previous, "id", &Product::default())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome {
            inserted: 1,
            updated: 1,
            deleted: 1
        }
    );

    let live = repo.select_all().await.unwrap();
    let names: Vec<_> = live.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, vec!["New B", "New A"]);
    assert_eq!(live[0].id, Some(2));
    assert!(repo.select_by_primary_key(&Value::Int(3)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reconcile_with_nothing_to_do() {
    let repo = product_repository();
    let outcome = repo
        .reconcile(&[], &[], "id", &Product::default())
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::default());
}

#[tokio::test]
async fn test_reconcile_is_atomic() {
    let repo = product_repository();
    repo.insert(&Product::new("A", "Kept", 1.0, 1)).await.unwrap();
    let previous = repo.select_all().await.unwrap();

    let fresh = Product::new("B", "Fresh", 1.0, 1);
    let blank = Product {
        id: Some(1),
        ..Product::default()
    };

    let err = repo
        .reconcile(&[fresh, blank], &previous, "id", &Product::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(repo.store().rows().await.unwrap().len(), 1);
}

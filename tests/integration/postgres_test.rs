//! Integration tests against a live PostgreSQL.
//!
//! Set `CRUDBASE_TEST_DATABASE_URL` to run them; they return early
//! otherwise.

use crudbase_core::config::{DatabaseConfig, PageConfig};
use crudbase_core::error::ErrorKind;
use crudbase_core::types::{Example, PageQuery, SortDirection, Value};
use crudbase_database::{BaseRepository, DatabasePool, PgStore};

use crate::helpers::Product;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS demo_product (
    id BIGSERIAL PRIMARY KEY,
    sku TEXT,
    name TEXT,
    price DOUBLE PRECISION,
    stock INTEGER,
    supplier_id BIGINT,
    del_flag TEXT NOT NULL DEFAULT '0',
    create_user TEXT,
    create_time TIMESTAMPTZ,
    update_user TEXT,
    update_time TIMESTAMPTZ
)"#;

async fn connect() -> Option<DatabasePool> {
    let url = std::env::var("CRUDBASE_TEST_DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
        connect_timeout_seconds: 5,
        idle_timeout_seconds: 60,
        migrations_dir: None,
    };
    let db = DatabasePool::connect(&config)
        .await
        .expect("Failed to connect to test database");
    sqlx::query(CREATE_TABLE)
        .execute(db.pool())
        .await
        .expect("create table");
    sqlx::query("TRUNCATE demo_product RESTART IDENTITY")
        .execute(db.pool())
        .await
        .expect("truncate");
    Some(db)
}

fn repository(db: &DatabasePool) -> BaseRepository<Product, PgStore<Product>> {
    BaseRepository::new(PgStore::new(db.pool().clone()), PageConfig::default())
}

// One test so the shared table is never truncated under a running case.
#[tokio::test]
async fn test_postgres_round_trip() {
    let Some(db) = connect().await else {
        return;
    };
    let repo = repository(&db);

    let seeded = (1..=4)
        .map(|i| Product::new(&format!("P-{i}"), &format!("Part {i}"), i as f64, i))
        .collect::<Vec<_>>();
    assert_eq!(repo.insert_list(&seeded).await.unwrap(), 4);

    // Soft delete hides the row from every read.
    let first = repo.select_by_primary_key(&Value::Int(1)).await.unwrap().unwrap();
    repo.delete_logical(&first).await.unwrap();
    assert!(repo.select_by_primary_key(&Value::Int(1)).await.unwrap().is_none());

    // Paging counts live rows only.
    let mut ordered = Example::new();
    ordered.order_by("sku", SortDirection::Desc);
    let page = repo
        .select_page_by_example(ordered, &PageQuery::page(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.data[0].sku.as_deref(), Some("P-4"));

    // Exclusive update: current stamp wins, stale stamp conflicts.
    let mut second = repo.select_by_primary_key(&Value::Int(2)).await.unwrap().unwrap();
    let observed = second.base.update_time;
    second.base.update_last_time = observed;
    second.stock = Some(42);
    assert_eq!(repo.update_by_primary_key_selective_exclusive(&second).await.unwrap(), 1);

    second.base.update_last_time = observed;
    let err = repo
        .update_by_primary_key_selective_exclusive(&second)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Reconcile inside one transaction.
    let previous = repo.select_all().await.unwrap();
    let kept = previous[0].clone();
    let fresh = Product::new("P-9", "Part 9", 9.0, 9);
    let outcome = repo
        .reconcile(&[kept, fresh], &previous, "id", &Product::default())
        .await
        .unwrap();
    assert_eq!((outcome.inserted, outcome.updated, outcome.deleted), (1, 1, 2));
    assert_eq!(repo.select_all().await.unwrap().len(), 2);

    // A failed transaction leaves nothing behind.
    let tx = repo.begin().await.unwrap();
    tx.insert(&Product::new("P-X", "Ghost", 0.0, 0)).await.unwrap();
    tx.rollback().await.unwrap();
    let mut ghost = Example::new();
    ghost.create_criteria().and_equal_to("sku", "P-X");
    assert!(repo.select_one_by_example(ghost).await.unwrap().is_none());

    db.close().await;
}

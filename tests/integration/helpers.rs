//! Shared test helpers for integration tests.

use chrono::Utc;
use serde::Serialize;

use crudbase_core::config::PageConfig;
use crudbase_core::result::AppResult;
use crudbase_core::types::Record;
use crudbase_database::{BaseRepository, MemoryStore};
use crudbase_entity::{BaseFields, ColumnDef, ColumnType, Entity, EntityMeta};

static PRODUCT_META: EntityMeta = EntityMeta::new(
    "demo_product",
    &[
        ColumnDef::key("id", ColumnType::BigInt),
        ColumnDef::new("sku", ColumnType::Text),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("price", ColumnType::Double),
        ColumnDef::new("stock", ColumnType::Int),
        ColumnDef::new("supplier_id", ColumnType::BigInt),
    ],
);

/// A catalog row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Option<i64>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub supplier_id: Option<i64>,
    #[serde(flatten)]
    pub base: BaseFields,
}

impl Product {
    pub fn new(sku: &str, name: &str, price: f64, stock: i64) -> Self {
        Self {
            id: None,
            sku: Some(sku.to_string()),
            name: Some(name.to_string()),
            price: Some(price),
            stock: Some(stock),
            supplier_id: None,
            base: BaseFields::created("it", Utc::now()),
        }
    }
}

impl Entity for Product {
    fn meta() -> &'static EntityMeta {
        &PRODUCT_META
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with("id", self.id)
            .with("sku", self.sku.clone())
            .with("name", self.name.clone())
            .with("price", self.price)
            .with("stock", self.stock)
            .with("supplier_id", self.supplier_id);
        self.base.write_to(&mut record);
        record
    }

    fn from_record(mut record: Record) -> AppResult<Self> {
        Ok(Self {
            id: record.take_i64("id")?,
            sku: record.take_string("sku")?,
            name: record.take_string("name")?,
            price: record.take_f64("price")?,
            stock: record.take_i64("stock")?,
            supplier_id: record.take_i64("supplier_id")?,
            base: BaseFields::read_from(&mut record)?,
        })
    }

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }
}

static SUPPLIER_META: EntityMeta = EntityMeta::new(
    "demo_supplier",
    &[
        ColumnDef::key("id", ColumnType::BigInt),
        ColumnDef::new("name", ColumnType::Text),
    ],
);

/// A supplier row, joined to products by the view query tests.
#[derive(Debug, Clone, Default)]
pub struct Supplier {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub base: BaseFields,
}

impl Supplier {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: Some(name.to_string()),
            base: BaseFields::created("it", Utc::now()),
        }
    }
}

impl Entity for Supplier {
    fn meta() -> &'static EntityMeta {
        &SUPPLIER_META
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with("id", self.id)
            .with("name", self.name.clone());
        self.base.write_to(&mut record);
        record
    }

    fn from_record(mut record: Record) -> AppResult<Self> {
        Ok(Self {
            id: record.take_i64("id")?,
            name: record.take_string("name")?,
            base: BaseFields::read_from(&mut record)?,
        })
    }

    fn base(&self) -> &BaseFields {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseFields {
        &mut self.base
    }
}

pub type ProductRepository = BaseRepository<Product, MemoryStore<Product>>;
pub type SupplierRepository = BaseRepository<Supplier, MemoryStore<Supplier>>;

/// An empty product repository with the default page size.
pub fn product_repository() -> ProductRepository {
    BaseRepository::new(MemoryStore::new(), PageConfig::default())
}

/// A product repository holding `A-1`..`A-n`, priced 10, 20, ...
pub async fn stocked(n: i64) -> ProductRepository {
    let repo = product_repository();
    let products: Vec<Product> = (1..=n)
        .map(|i| Product::new(&format!("A-{i}"), &format!("Item {i}"), 10.0 * i as f64, i))
        .collect();
    repo.insert_list(&products).await.expect("seed products");
    repo
}

pub async fn suppliers(names: &[&str]) -> SupplierRepository {
    let repo = BaseRepository::new(MemoryStore::new(), PageConfig::default());
    for name in names {
        repo.insert(&Supplier::new(name)).await.expect("seed supplier");
    }
    repo
}

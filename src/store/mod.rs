//! Persistence seam for the catalog.
//!
//! Handlers only talk to [`CatalogStore`]. `MongoStore` is the production
//! backend; `MemoryStore` keeps everything in process and is selected with
//! `CATALOG_STORE=memory` (and used by the test suite).

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{Category, CategoryUpdate, Product, ProductUpdate, UpdateOutcome};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("document encoding error: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
}

/// Filters for product listings. Results always come back newest first.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Match products in any of these categories.
    pub categories: Option<Vec<ObjectId>>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn find_category(&self, id: ObjectId) -> Result<Option<Category>, StoreError>;
    /// Assigns a fresh id and returns the stored category.
    async fn insert_category(&self, category: Category) -> Result<Category, StoreError>;
    async fn update_category(&self, id: ObjectId, update: &CategoryUpdate) -> Result<UpdateOutcome, StoreError>;
    async fn delete_category(&self, id: ObjectId) -> Result<bool, StoreError>;
    /// Unsets `parent` on every direct child of `id`. Returns how many changed.
    async fn detach_children(&self, id: ObjectId) -> Result<u64, StoreError>;

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError>;
    async fn find_product(&self, id: ObjectId) -> Result<Option<Product>, StoreError>;
    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, StoreError>;
    async fn insert_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn update_product(&self, id: ObjectId, update: &ProductUpdate) -> Result<UpdateOutcome, StoreError>;
    async fn delete_product(&self, id: ObjectId) -> Result<bool, StoreError>;
}

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{CatalogStore, ProductQuery, StoreError};
use crate::models::{Category, CategoryUpdate, Product, ProductUpdate, UpdateOutcome};

#[derive(Default)]
pub struct MemoryStore {
    categories: RwLock<Vec<Category>>,
    products: RwLock<Vec<Product>>,
}

impl MemoryStore {
    pub fn new() -> Self{
        Self::default()
    }
}

fn outcome(matched: bool, modified: bool) -> UpdateOutcome{
    UpdateOutcome { acknowledged: true, matched: u64::from(matched), modified: u64::from(modified) }
}

fn matches(product: &Product, query: &ProductQuery) -> bool{
    if let Some(categories) = &query.categories {
        match product.category {
            Some(category) if categories.contains(&category) => {}
            _ => return false,
        }
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !product.title.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    true
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>{
        Ok(self.categories.read().await.clone())
    }

    async fn find_category(&self, id: ObjectId) -> Result<Option<Category>, StoreError>{
        let categories = self.categories.read().await;
        Ok(categories.iter().find(|c| c.id == Some(id)).cloned())
    }

    async fn insert_category(&self, mut category: Category) -> Result<Category, StoreError>{
        category.id = Some(ObjectId::new());
        self.categories.write().await.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: ObjectId, update: &CategoryUpdate) -> Result<UpdateOutcome, StoreError>{
        let mut categories = self.categories.write().await;
        Ok(match categories.iter_mut().find(|c| c.id == Some(id)) {
            Some(category) => outcome(true, update.apply(category)),
            None => outcome(false, false),
        })
    }

    async fn delete_category(&self, id: ObjectId) -> Result<bool, StoreError>{
        let mut categories = self.categories.write().await;
        let before = categories.len();
        categories.retain(|c| c.id != Some(id));
        Ok(categories.len() != before)
    }

    async fn detach_children(&self, id: ObjectId) -> Result<u64, StoreError>{
        let mut categories = self.categories.write().await;
        let mut changed = 0;
        for category in categories.iter_mut().filter(|c| c.parent == Some(id)) {
            category.parent = None;
            changed += 1;
        }
        Ok(changed)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError>{
        let products = self.products.read().await;
        let mut found: Vec<Product> = products.iter().filter(|p| matches(p, query)).cloned().collect();
        found.sort_by(|a, b| b.id.cmp(&a.id));
        if let Some(limit) = query.limit.and_then(|l| usize::try_from(l).ok()).filter(|&l| l > 0) {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn find_product(&self, id: ObjectId) -> Result<Option<Product>, StoreError>{
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == Some(id)).cloned())
    }

    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, StoreError>{
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| p.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn insert_product(&self, mut product: Product) -> Result<Product, StoreError>{
        product.id = Some(ObjectId::new());
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ObjectId, update: &ProductUpdate) -> Result<UpdateOutcome, StoreError>{
        let mut products = self.products.write().await;
        Ok(match products.iter_mut().find(|p| p.id == Some(id)) {
            Some(product) => outcome(true, update.apply(product)),
            None => outcome(false, false),
        })
    }

    async fn delete_product(&self, id: ObjectId) -> Result<bool, StoreError>{
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != Some(id));
        Ok(products.len() != before)
    }
}

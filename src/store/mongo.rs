use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    Client, Collection, Database,
    bson::{self, Document, doc, oid::ObjectId},
    options::ClientOptions,
};
use tracing::{debug, info};

use super::{CatalogStore, ProductQuery, StoreError};
use crate::models::{Category, CategoryUpdate, Product, ProductUpdate, UpdateOutcome};

const CATEGORIES: &str = "categories";
const PRODUCTS: &str = "products";

pub struct MongoStore {
    categories: Collection<Category>,
    products: Collection<Product>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError>{
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;
        info!("Connected to MongoDB database {database}");
        Ok(Self::new(&db))
    }

    pub fn new(db: &Database) -> Self{
        Self {
            categories: db.collection::<Category>(CATEGORIES),
            products: db.collection::<Product>(PRODUCTS),
        }
    }
}

fn category_update_doc(update: &CategoryUpdate) -> Result<Document, StoreError>{
    let mut set = Document::new();
    let mut unset = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name);
    }
    match update.parent {
        Some(Some(parent)) => {
            set.insert("parent", parent);
        }
        Some(None) => {
            unset.insert("parent", "");
        }
        None => {}
    }
    if let Some(properties) = &update.properties {
        set.insert("properties", bson::to_bson(properties)?);
    }
    Ok(modifiers(set, unset))
}

fn product_update_doc(update: &ProductUpdate) -> Result<Document, StoreError>{
    let mut set = Document::new();
    let mut unset = Document::new();
    if let Some(title) = &update.title {
        set.insert("title", title);
    }
    if let Some(description) = &update.description {
        set.insert("description", description);
    }
    if let Some(price) = update.price {
        set.insert("price", price);
    }
    if let Some(images) = &update.images {
        set.insert("images", images.clone());
    }
    match update.category {
        Some(Some(category)) => {
            set.insert("category", category);
        }
        Some(None) => {
            unset.insert("category", "");
        }
        None => {}
    }
    if let Some(properties) = &update.properties {
        set.insert("properties", bson::to_bson(properties)?);
    }
    if let Some(updated_at) = update.updated_at {
        set.insert("updatedAt", updated_at);
    }
    Ok(modifiers(set, unset))
}

fn modifiers(set: Document, unset: Document) -> Document{
    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

/// Escapes regex metacharacters so user search text matches literally.
fn escape_regex(text: &str) -> String{
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if "\\.+*?()|[]{}^$#-".contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn product_filter(query: &ProductQuery) -> Document{
    let mut filter = Document::new();
    if let Some(categories) = &query.categories {
        filter.insert("category", doc! { "$in": categories.clone() });
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert("title", doc! { "$regex": escape_regex(search.trim()), "$options": "i" });
    }
    filter
}

#[async_trait]
impl CatalogStore for MongoStore {
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>{
        let cursor = self.categories.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_category(&self, id: ObjectId) -> Result<Option<Category>, StoreError>{
        Ok(self.categories.find_one(doc! { "_id": id }).await?)
    }

    async fn insert_category(&self, mut category: Category) -> Result<Category, StoreError>{
        category.id = Some(ObjectId::new());
        self.categories.insert_one(&category).await?;
        Ok(category)
    }

    async fn update_category(&self, id: ObjectId, update: &CategoryUpdate) -> Result<UpdateOutcome, StoreError>{
        let update_doc = category_update_doc(update)?;
        if update_doc.is_empty() {
            let matched = self.categories.count_documents(doc! { "_id": id }).await?;
            return Ok(UpdateOutcome { acknowledged: true, matched, modified: 0 });
        }
        debug!("categories.update_one {id}: {update_doc:?}");
        let result = self.categories.update_one(doc! { "_id": id }, update_doc).await?;
        Ok(UpdateOutcome {
            acknowledged: true,
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_category(&self, id: ObjectId) -> Result<bool, StoreError>{
        let result = self.categories.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn detach_children(&self, id: ObjectId) -> Result<u64, StoreError>{
        let result = self
            .categories
            .update_many(doc! { "parent": id }, doc! { "$unset": { "parent": "" } })
            .await?;
        Ok(result.modified_count)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError>{
        let filter = product_filter(query);
        debug!("products.find {filter:?}");
        let mut find = self.products.find(filter).sort(doc! { "_id": -1 });
        if let Some(limit) = query.limit {
            find = find.limit(limit);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_product(&self, id: ObjectId) -> Result<Option<Product>, StoreError>{
        Ok(self.products.find_one(doc! { "_id": id }).await?)
    }

    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, StoreError>{
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.products.find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_product(&self, mut product: Product) -> Result<Product, StoreError>{
        product.id = Some(ObjectId::new());
        self.products.insert_one(&product).await?;
        Ok(product)
    }

    async fn update_product(&self, id: ObjectId, update: &ProductUpdate) -> Result<UpdateOutcome, StoreError>{
        let update_doc = product_update_doc(update)?;
        if update_doc.is_empty() {
            let matched = self.products.count_documents(doc! { "_id": id }).await?;
            return Ok(UpdateOutcome { acknowledged: true, matched, modified: 0 });
        }
        let result = self.products.update_one(doc! { "_id": id }, update_doc).await?;
        Ok(UpdateOutcome {
            acknowledged: true,
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_product(&self, id: ObjectId) -> Result<bool, StoreError>{
        let result = self.products.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

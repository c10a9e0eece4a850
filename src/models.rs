use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ObjectId>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<bson::DateTime>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
}

/// Partial category update. `None` leaves a field untouched;
/// `parent: Some(None)` detaches the category from its parent.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub parent: Option<Option<ObjectId>>,
    pub properties: Option<Vec<PropertyDef>>,
}

impl CategoryUpdate {
    /// Returns whether anything changed.
    pub fn apply(&self, category: &mut Category) -> bool{
        let before = category.clone();
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(parent) = self.parent {
            category.parent = parent;
        }
        if let Some(properties) = &self.properties {
            category.properties = properties.clone();
        }
        *category != before
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub category: Option<Option<ObjectId>>,
    pub properties: Option<BTreeMap<String, String>>,
    pub updated_at: Option<bson::DateTime>,
}

impl ProductUpdate {
    pub fn apply(&self, product: &mut Product) -> bool{
        let before = product.clone();
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(images) = &self.images {
            product.images = images.clone();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(properties) = &self.properties {
            product.properties = properties.clone();
        }
        if let Some(updated_at) = self.updated_at {
            product.updated_at = Some(updated_at);
        }
        *product != before
    }
}

/// Result of an update, shaped like the driver's update result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    #[serde(rename = "matchedCount")]
    pub matched: u64,
    #[serde(rename = "modifiedCount")]
    pub modified: u64,
}

// Views sent to HTTP clients. Ids are rendered as hex strings.

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ParentRef {
    Populated(Box<CategoryView>),
    Id(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub parent: Option<ParentRef>,
    pub properties: Vec<PropertyDef>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self{
        Self {
            id: hex_or_empty(category.id),
            name: category.name.clone(),
            parent: category.parent.map(|p| ParentRef::Id(p.to_hex())),
            properties: category.properties.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub properties: BTreeMap<String, String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self{
        Self {
            id: hex_or_empty(product.id),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            images: product.images.clone(),
            category: product.category.map(|c| c.to_hex()),
            properties: product.properties.clone(),
            created_at: product.created_at.map(bson::DateTime::to_chrono),
            updated_at: product.updated_at.map(bson::DateTime::to_chrono),
        }
    }
}

fn hex_or_empty(id: Option<ObjectId>) -> String{
    id.map(|id| id.to_hex()).unwrap_or_default()
}

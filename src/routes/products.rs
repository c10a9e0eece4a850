use std::collections::BTreeMap;

use axum::{Router, routing::get, extract::{State, Query}, Json, http::HeaderMap, response::IntoResponse};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use tracing::{debug, info};

use crate::category_tree::CategoryTree;
use crate::error::AppError;
use crate::models::{Product, ProductUpdate, ProductView, UpdateOutcome};
use crate::routes::common::{ApiResult, now_datetime, parse_object_id, parse_reference, require_admin};
use crate::state::AppState;
use crate::store::ProductQuery;

const MAX_LIMIT: i64 = 100;
const NEW_PRODUCTS_LIMIT: i64 = 10;
/// Keeps cart totals (price times quantity) finite.
const MAX_PRICE: f64 = 1_000_000_000.0;

/// The admin form posts price as text; API clients send numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    fn value(&self) -> Result<f64, AppError>{
        let price = match self {
            PriceInput::Number(n) => *n,
            PriceInput::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::validation("price must be a number"))?,
        };
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::validation("price must be a non-negative number"));
        }
        if price > MAX_PRICE {
            return Err(AppError::validation(format!("price must not exceed {MAX_PRICE}")));
        }
        Ok(price)
    }
}

#[derive(Deserialize)]
struct ProductRequest {
    #[serde(rename = "_id")]
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    price: Option<PriceInput>,
    images: Option<Vec<String>>,
    category: Option<String>,
    properties: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize)]
struct ProductListQuery {
    id: Option<String>,
    category: Option<String>,
    search: Option<String>,
    limit: Option<i64>,
    #[serde(rename = "includeSubcategories", default)]
    include_subcategories: bool,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct DeleteQuery {
    #[serde(alias = "_id")]
    id: String,
}

fn normalize_title(raw: &str) -> Result<String, AppError>{
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::validation("product title is required"));
    }
    Ok(title.to_string())
}

fn normalize_images(images: Vec<String>) -> Vec<String>{
    images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

fn normalize_properties(properties: BTreeMap<String, String>) -> BTreeMap<String, String>{
    properties
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}

fn clamp_limit(limit: Option<i64>) -> Option<i64>{
    limit.map(|l| l.clamp(1, MAX_LIMIT))
}

async fn ensure_category_exists(state: &AppState, category: Option<ObjectId>) -> Result<(), AppError>{
    if let Some(id) = category {
        if state.store.find_category(id).await?.is_none() {
            return Err(AppError::validation("category does not exist"));
        }
    }
    Ok(())
}

fn views(products: &[Product]) -> Vec<ProductView>{
    products.iter().map(ProductView::from).collect()
}

// GET /api/products, GET /api/products?id=
async fn list_products(State(state): State<AppState>, Query(query): Query<ProductListQuery>) -> ApiResult{
    if let Some(id) = query.id.as_deref() {
        let id = parse_object_id(id, "id")?;
        let product = state.store.find_product(id).await?.ok_or(AppError::NotFound("product"))?;
        return Ok(Json(ProductView::from(&product)).into_response());
    }

    let categories = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        None => None,
        Some(raw) => {
            let id = parse_object_id(raw, "category")?;
            if query.include_subcategories {
                let all = state.store.list_categories().await?;
                Some(CategoryTree::new(&all).descendants(id))
            } else {
                Some(vec![id])
            }
        }
    };

    let filter = ProductQuery { categories, search: query.search, limit: clamp_limit(query.limit) };
    debug!("Listing products with {filter:?}");
    let products = state.store.list_products(&filter).await?;
    Ok(Json(views(&products)).into_response())
}

// GET /api/products/new
async fn new_products(State(state): State<AppState>, Query(query): Query<LimitQuery>) -> ApiResult<Json<Vec<ProductView>>>{
    let filter = ProductQuery {
        limit: clamp_limit(query.limit.or(Some(NEW_PRODUCTS_LIMIT))),
        ..Default::default()
    };
    let products = state.store.list_products(&filter).await?;
    Ok(Json(views(&products)))
}

// POST /api/products
async fn create_product(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<ProductRequest>) -> ApiResult<Json<ProductView>>{
    require_admin(&headers, &state.config)?;

    let title = normalize_title(payload.title.as_deref().unwrap_or_default())?;
    let price = payload.price.as_ref().ok_or_else(|| AppError::validation("price is required"))?.value()?;
    let category = parse_reference(payload.category.as_deref(), "category")?.flatten();
    ensure_category_exists(&state, category).await?;

    let now = now_datetime();
    let product = Product {
        id: None,
        title,
        description: payload.description.unwrap_or_default(),
        price,
        images: normalize_images(payload.images.unwrap_or_default()),
        category,
        properties: normalize_properties(payload.properties.unwrap_or_default()),
        created_at: Some(now),
        updated_at: Some(now),
    };
    let created = state.store.insert_product(product).await?;
    let view = ProductView::from(&created);
    info!("Created product {:?} ({})", view.title, view.id);
    Ok(Json(view))
}

// PUT /api/products
async fn update_product(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<ProductRequest>) -> ApiResult<Json<UpdateOutcome>>{
    require_admin(&headers, &state.config)?;
    let raw_id = payload.id.as_deref().ok_or_else(|| AppError::validation("_id is required"))?;
    let id = parse_object_id(raw_id, "_id")?;

    let category = parse_reference(payload.category.as_deref(), "category")?;
    if let Some(target) = category {
        ensure_category_exists(&state, target).await?;
    }

    let update = ProductUpdate {
        title: payload.title.as_deref().map(normalize_title).transpose()?,
        description: payload.description,
        price: payload.price.as_ref().map(PriceInput::value).transpose()?,
        images: payload.images.map(normalize_images),
        category,
        properties: payload.properties.map(normalize_properties),
        updated_at: Some(now_datetime()),
    };

    let outcome = state.store.update_product(id, &update).await?;
    if outcome.matched == 0 {
        return Err(AppError::NotFound("product"));
    }
    info!("Updated product {id} (modified: {})", outcome.modified);
    Ok(Json(outcome))
}

// DELETE /api/products?id=
async fn delete_product(State(state): State<AppState>, headers: HeaderMap, Query(query): Query<DeleteQuery>) -> ApiResult<Json<&'static str>>{
    require_admin(&headers, &state.config)?;
    let id = parse_object_id(&query.id, "id")?;
    if state.store.delete_product(id).await? {
        info!("Deleted product {id}");
    }
    Ok(Json("ok"))
}

pub fn products_router(state: AppState) -> Router{
    Router::new()
        .route("/", get(list_products).post(create_product).put(update_product).delete(delete_product))
        .route("/new", get(new_products))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(json: serde_json::Value) -> Result<f64, AppError>{
        serde_json::from_value::<PriceInput>(json).unwrap().value()
    }

    #[test]
    fn price_accepts_numbers_and_numeric_text() {
        assert_eq!(price(serde_json::json!(19.99)).unwrap(), 19.99);
        assert_eq!(price(serde_json::json!(250)).unwrap(), 250.0);
        assert_eq!(price(serde_json::json!(" 1200 ")).unwrap(), 1200.0);
    }

    #[test]
    fn price_rejects_negative_and_garbage() {
        assert!(price(serde_json::json!(-1)).is_err());
        assert!(price(serde_json::json!("free")).is_err());
        assert!(price(serde_json::json!("NaN")).is_err());
    }

    #[test]
    fn price_is_capped() {
        assert_eq!(price(serde_json::json!(MAX_PRICE)).unwrap(), MAX_PRICE);
        assert!(price(serde_json::json!(1e308)).is_err());
        assert!(price(serde_json::json!("1e300")).is_err());
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None), None);
        assert_eq!(clamp_limit(Some(0)), Some(1));
        assert_eq!(clamp_limit(Some(5000)), Some(MAX_LIMIT));
    }

    #[test]
    fn blank_images_and_properties_are_dropped() {
        assert_eq!(normalize_images(vec![" a.png ".into(), "".into()]), ["a.png"]);
        let props = BTreeMap::from([("color".to_string(), "red".to_string()), ("size".to_string(), " ".to_string())]);
        assert_eq!(normalize_properties(props).len(), 1);
    }
}

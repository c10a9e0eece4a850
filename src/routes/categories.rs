use std::collections::HashSet;

use axum::{Router, routing::get, extract::{State, Path, Query}, Json, http::HeaderMap};
use serde::Deserialize;
use tracing::info;

use crate::category_tree::CategoryTree;
use crate::error::AppError;
use crate::models::{Category, CategoryUpdate, CategoryView, PropertyDef, UpdateOutcome};
use crate::routes::common::{ApiResult, parse_object_id, parse_reference, require_admin};
use crate::state::AppState;

/// Property values arrive either as a list or as the comma-separated text the admin form edits.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValuesInput {
    List(Vec<String>),
    Text(String),
}

#[derive(Deserialize)]
struct PropertyInput {
    name: String,
    values: Option<ValuesInput>,
}

#[derive(Deserialize)]
struct CreateCategoryRequest {
    name: Option<String>,
    #[serde(rename = "parentCategory")]
    parent_category: Option<String>,
    properties: Option<Vec<PropertyInput>>,
}

#[derive(Deserialize)]
struct UpdateCategoryRequest {
    #[serde(rename = "_id")]
    id: String,
    name: Option<String>,
    #[serde(rename = "parentCategory")]
    parent_category: Option<String>,
    properties: Option<Vec<PropertyInput>>,
}

#[derive(Deserialize)]
struct DeleteQuery {
    #[serde(rename = "_id", alias = "id")]
    id: String,
}

fn normalize_name(raw: &str) -> Result<String, AppError>{
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation("category name is required"));
    }
    Ok(name.to_string())
}

fn normalize_properties(input: Vec<PropertyInput>) -> Result<Vec<PropertyDef>, AppError>{
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(input.len());
    for property in input {
        let name = property.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("property name is required"));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(AppError::validation(format!("duplicate property `{name}`")));
        }
        let raw_values = match property.values {
            None => Vec::new(),
            Some(ValuesInput::List(values)) => values,
            Some(ValuesInput::Text(text)) => text.split(',').map(str::to_string).collect(),
        };
        let values = raw_values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        out.push(PropertyDef { name, values });
    }
    Ok(out)
}

// GET /api/categories
async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<CategoryView>>>{
    let categories = state.store.list_categories().await?;
    let tree = CategoryTree::new(&categories);
    Ok(Json(categories.iter().map(|c| tree.populated_view(c)).collect()))
}

// GET /api/categories/{id}/properties
async fn category_properties(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<Json<Vec<PropertyDef>>>{
    let id = parse_object_id(&id, "id")?;
    let categories = state.store.list_categories().await?;
    let tree = CategoryTree::new(&categories);
    if tree.get(id).is_none() {
        return Err(AppError::NotFound("category"));
    }
    Ok(Json(tree.inherited_properties(id)))
}

// POST /api/categories
async fn create_category(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<CreateCategoryRequest>) -> ApiResult<Json<CategoryView>>{
    require_admin(&headers, &state.config)?;

    let name = normalize_name(payload.name.as_deref().unwrap_or_default())?;
    let parent = parse_reference(payload.parent_category.as_deref(), "parentCategory")?.flatten();
    if let Some(parent_id) = parent {
        if state.store.find_category(parent_id).await?.is_none() {
            return Err(AppError::validation("parent category does not exist"));
        }
    }
    let properties = normalize_properties(payload.properties.unwrap_or_default())?;

    let created = state.store.insert_category(Category { id: None, name, parent, properties }).await?;
    let view = CategoryView::from(&created);
    info!("Created category {:?} ({})", view.name, view.id);
    Ok(Json(view))
}

// PUT /api/categories
async fn update_category(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<UpdateCategoryRequest>) -> ApiResult<Json<UpdateOutcome>>{
    require_admin(&headers, &state.config)?;
    let id = parse_object_id(&payload.id, "_id")?;

    let update = CategoryUpdate {
        name: payload.name.as_deref().map(normalize_name).transpose()?,
        parent: parse_reference(payload.parent_category.as_deref(), "parentCategory")?,
        properties: payload.properties.map(normalize_properties).transpose()?,
    };

    if let Some(Some(parent_id)) = update.parent {
        let categories = state.store.list_categories().await?;
        let tree = CategoryTree::new(&categories);
        if tree.get(id).is_none() {
            return Err(AppError::NotFound("category"));
        }
        if parent_id != id && tree.get(parent_id).is_none() {
            return Err(AppError::validation("parent category does not exist"));
        }
        if tree.would_cycle(id, parent_id) {
            return Err(AppError::CategoryCycle);
        }
    }

    let outcome = state.store.update_category(id, &update).await?;
    if outcome.matched == 0 {
        return Err(AppError::NotFound("category"));
    }
    info!("Updated category {id} (modified: {})", outcome.modified);
    Ok(Json(outcome))
}

// DELETE /api/categories?_id=
async fn delete_category(State(state): State<AppState>, headers: HeaderMap, Query(query): Query<DeleteQuery>) -> ApiResult<Json<&'static str>>{
    require_admin(&headers, &state.config)?;
    let id = parse_object_id(&query.id, "_id")?;

    if state.store.delete_category(id).await? {
        let detached = state.store.detach_children(id).await?;
        info!("Deleted category {id}, detached {detached} subcategories");
    }
    Ok(Json("ok"))
}

pub fn categories_router(state: AppState) -> Router{
    Router::new()
        .route("/", get(list_categories).post(create_category).put(update_category).delete(delete_category))
        .route("/{id}/properties", get(category_properties))
        .with_state(state)
}

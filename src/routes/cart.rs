use std::collections::HashMap;

use axum::{Router, routing::post, extract::State, Json};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Product, ProductView};
use crate::routes::common::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
struct CartRequest {
    /// One entry per unit; an id repeats for each extra item of that product.
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CartLine {
    product: ProductView,
    quantity: u32,
    #[serde(rename = "lineTotal")]
    line_total: f64,
}

#[derive(Debug, Serialize)]
struct CartResponse {
    products: Vec<ProductView>,
    lines: Vec<CartLine>,
    total: f64,
}

fn round_cents(amount: f64) -> f64{
    (amount * 100.0).round() / 100.0
}

/// Groups repeated ids into lines, keeping first-seen order. Ids with no product are skipped.
fn price_cart(ids: &[ObjectId], products: &[Product]) -> (Vec<CartLine>, f64){
    let by_id: HashMap<ObjectId, &Product> = products.iter().filter_map(|p| p.id.map(|id| (id, p))).collect();

    let mut order: Vec<ObjectId> = Vec::new();
    let mut counts: HashMap<ObjectId, u32> = HashMap::new();
    for id in ids {
        if !by_id.contains_key(id) {
            continue;
        }
        let count = counts.entry(*id).or_insert(0);
        if *count == 0 {
            order.push(*id);
        }
        *count += 1;
    }

    let mut total = 0.0;
    let lines = order
        .into_iter()
        .map(|id| {
            let product = by_id[&id];
            let quantity = counts[&id];
            let line_total = round_cents(product.price * f64::from(quantity));
            total += line_total;
            CartLine { product: ProductView::from(product), quantity, line_total }
        })
        .collect();
    (lines, round_cents(total))
}

// POST /api/cart
async fn cart_contents(State(state): State<AppState>, Json(payload): Json<CartRequest>) -> ApiResult<Json<CartResponse>>{
    let ids: Vec<ObjectId> = payload.ids.iter().filter_map(|raw| ObjectId::parse_str(raw.trim()).ok()).collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();

    let products = state.store.find_products(&unique).await?;
    debug!("Cart lookup: {} ids, {} products found", payload.ids.len(), products.len());

    let (lines, total) = price_cart(&ids, &products);
    let products = lines.iter().map(|line| line.product.clone()).collect();
    Ok(Json(CartResponse { products, lines, total }))
}

pub fn cart_router(state: AppState) -> Router{
    Router::new()
        .route("/", post(cart_contents))
        .with_state(state)
}

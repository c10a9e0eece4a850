use axum::Router;

use crate::state::AppState;

pub mod common;
mod cart;
mod categories;
mod products;
mod upload;

pub fn api_router(state: AppState) -> Router{
    // every endpoint the admin dashboard and storefront call lives under /api
    Router::new()
        .nest("/categories", categories::categories_router(state.clone()))
        .nest("/products", products::products_router(state.clone()))
        .nest("/productUpload", upload::upload_router(state.clone()))
        .nest("/cart", cart::cart_router(state))
}

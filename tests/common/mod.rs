#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use ecommerce_catalog::{
    app,
    config::Config,
    routes::common::sign_token,
    state::AppState,
    store::MemoryStore,
};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub fn test_app(upload_dir: &Path) -> Router {
    let upload_dir = upload_dir.to_string_lossy().to_string();
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "CATALOG_STORE" => Some("memory".to_string()),
        "ADMIN_EMAILS" => Some("owner@shop.test".to_string()),
        "UPLOAD_DIR" => Some(upload_dir.clone()),
        "PUBLIC_BASE_URL" => Some("http://shop.test".to_string()),
        "MAX_UPLOAD_BYTES" => Some("4096".to_string()),
        _ => None,
    })
    .unwrap();
    app(AppState::new(Arc::new(MemoryStore::new()), config))
}

pub fn admin_token() -> String {
    sign_token(SECRET, "admin-1", "admin@shop.test", "admin", 1).unwrap()
}

pub fn customer_token() -> String {
    sign_token(SECRET, "cust-1", "buyer@shop.test", "customer", 1).unwrap()
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    read(app.clone().oneshot(request).await.unwrap()).await
}

pub async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, value)
}

pub async fn admin(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, method, uri, Some(body), Some(&admin_token())).await
}

pub async fn create_category(app: &Router, body: Value) -> String {
    let (status, created) = admin(app, "POST", "/api/categories", body).await;
    assert_eq!(status, StatusCode::OK, "{created}");
    created["_id"].as_str().unwrap().to_string()
}

pub async fn create_product(app: &Router, body: Value) -> String {
    let (status, created) = admin(app, "POST", "/api/products", body).await;
    assert_eq!(status, StatusCode::OK, "{created}");
    created["_id"].as_str().unwrap().to_string()
}

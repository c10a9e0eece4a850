mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{admin, create_category, customer_token, send, test_app};

#[tokio::test]
async fn create_then_list_populates_parent() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let electronics = create_category(&app, json!({ "name": "Electronics", "parentCategory": "" })).await;
    let phones = create_category(
        &app,
        json!({ "name": "Phones", "parentCategory": electronics, "properties": [{ "name": "storage", "values": "64GB,128GB" }] }),
    )
    .await;

    let (status, list) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);

    let phones_view = list.iter().find(|c| c["_id"] == phones.as_str()).unwrap();
    assert_eq!(phones_view["parent"]["_id"], electronics.as_str());
    assert_eq!(phones_view["parent"]["name"], "Electronics");
    assert_eq!(phones_view["properties"][0]["values"], json!(["64GB", "128GB"]));

    let root_view = list.iter().find(|c| c["_id"] == electronics.as_str()).unwrap();
    assert!(root_view["parent"].is_null());
}

#[tokio::test]
async fn mutations_require_an_admin() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, body) = send(&app, "POST", "/api/categories", Some(json!({ "name": "Shoes" })), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "auth.invalid");

    let token = customer_token();
    let (status, body) = send(&app, "POST", "/api/categories", Some(json!({ "name": "Shoes" })), Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "auth.forbidden");

    let (_, list) = send(&app, "GET", "/api/categories", None, None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn listed_admin_email_may_mutate() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let token = ecommerce_catalog::routes::common::sign_token(common::SECRET, "o-1", "owner@shop.test", "customer", 1).unwrap();

    let (status, _) = send(&app, "POST", "/api/categories", Some(json!({ "name": "Books" })), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let id = create_category(&app, json!({ "name": "Audio", "properties": [{ "name": "color", "values": ["black"] }] })).await;

    let (status, outcome) = admin(&app, "PUT", "/api/categories", json!({ "_id": id, "name": "Hi-Fi" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["matchedCount"], 1);
    assert_eq!(outcome["modifiedCount"], 1);

    let (_, list) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(list[0]["name"], "Hi-Fi");
    assert_eq!(list[0]["properties"][0]["name"], "color");
}

#[tokio::test]
async fn empty_parent_clears_and_cycles_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let root = create_category(&app, json!({ "name": "Home" })).await;
    let child = create_category(&app, json!({ "name": "Kitchen", "parentCategory": root })).await;

    let (status, body) = admin(&app, "PUT", "/api/categories", json!({ "_id": root, "parentCategory": child })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "category.cycle");

    let (status, body) = admin(&app, "PUT", "/api/categories", json!({ "_id": root, "parentCategory": root })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "category.cycle");

    let (status, _) = admin(&app, "PUT", "/api/categories", json!({ "_id": child, "parentCategory": "" })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = send(&app, "GET", "/api/categories", None, None).await;
    assert!(list.as_array().unwrap().iter().all(|c| c["parent"].is_null()));
}

#[tokio::test]
async fn unknown_ids_and_parents_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let missing = mongodb::bson::oid::ObjectId::new().to_hex();

    let (status, body) = admin(&app, "PUT", "/api/categories", json!({ "_id": missing, "name": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "category.not_found");

    let (status, _) = admin(&app, "POST", "/api/categories", json!({ "name": "x", "parentCategory": missing })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = admin(&app, "POST", "/api/categories", json!({ "name": "x", "parentCategory": "not-an-id" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation.failed");

    let (status, _) = admin(&app, "POST", "/api/categories", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_and_detaches_children() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let root = create_category(&app, json!({ "name": "Garden" })).await;
    let child = create_category(&app, json!({ "name": "Tools", "parentCategory": root })).await;

    let token = common::admin_token();
    let (status, body) = send(&app, "DELETE", &format!("/api/categories?_id={root}"), None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (_, list) = send(&app, "GET", "/api/categories", None, None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["_id"], child.as_str());
    assert!(list[0]["parent"].is_null());

    let (status, _) = send(&app, "DELETE", &format!("/api/categories?_id={root}"), None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn inherited_properties_walk_up_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let clothing = create_category(&app, json!({ "name": "Clothing", "properties": [{ "name": "size", "values": "S,M,L" }] })).await;
    let shirts = create_category(
        &app,
        json!({ "name": "Shirts", "parentCategory": clothing, "properties": [{ "name": "sleeve", "values": ["short", "long"] }] }),
    )
    .await;

    let (status, props) = send(&app, "GET", &format!("/api/categories/{shirts}/properties"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = props.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["sleeve", "size"]);

    let missing = mongodb::bson::oid::ObjectId::new().to_hex();
    let (status, _) = send(&app, "GET", &format!("/api/categories/{missing}/properties"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! HTTP API tests
//!
//! Drive the full router against the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use cafe_inventory_backend::store::{DynStore, MemoryStore};
use cafe_inventory_backend::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let store: DynStore = Arc::new(MemoryStore::new());
    create_app(AppState::new(store, Config::in_memory("espresso")).unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, body) = send_raw(app, method, uri, body).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

async fn create_item(app: &Router, name: &str, quantity: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "name": name, "quantity_in_stock": quantity })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_dashboard() {
    let app = app();
    let item = create_item(&app, "Beans", 3).await;
    create_item(&app, "Filters", 100).await;
    send(
        &app,
        Method::POST,
        "/api/v1/orders",
        Some(json!({
            "items": [{ "item": item, "quantity": 2 }],
            "submit_type": "save"
        })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/v1/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_items"], 2);
    assert_eq!(body["open_orders"], 1);
    assert_eq!(body["unsubmitted_counts"], 0);
    assert_eq!(body["draft_receipts"], 0);
}

#[tokio::test]
async fn test_item_create_validation_and_duplicates() {
    let app = app();
    let id = create_item(&app, "Oat Milk", 12).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/items/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_in_stock"], 12);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "name": "", "quantity_in_stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "name");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "name": "Oat Milk", "quantity_in_stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_ENTRY");
    assert_eq!(body["error"]["conflict"]["id"], id.as_str());
}

#[tokio::test]
async fn test_delete_with_wrong_password() {
    let app = app();
    let item = create_item(&app, "Beans", 3).await;
    let (status, order) = send(
        &app,
        Method::POST,
        "/api/v1/orders",
        Some(json!({
            "items": [{ "item": item, "quantity": 4 }],
            "submit_type": "save"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/v1/orders/{}", order["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, Some(json!({ "password": "latte" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_PASSWORD");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(json!({ "password": "espresso" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_receipt_for_order_redirects() {
    let app = app();
    let item = create_item(&app, "Beans", 3).await;
    let (_, order) = send(
        &app,
        Method::POST,
        "/api/v1/orders",
        Some(json!({
            "items": [{ "item": item, "quantity": 4 }],
            "submit_type": "submit"
        })),
    )
    .await;
    assert_eq!(order["status"], "ordered");
    let uri = format!("/api/v1/receiving/orders/{}", order["id"].as_str().unwrap());
    let delivery = json!({
        "items": [{ "item": item, "quantity": "4" }],
        "submit_type": "submit"
    });

    let (status, receipt) = send(&app, Method::POST, &uri, Some(delivery.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let receipt_id = receipt["id"].as_str().unwrap().to_string();

    let (status, headers, _) = send_raw(&app, Method::POST, &uri, Some(delivery.clone())).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers[header::LOCATION],
        format!("/api/v1/receiving/{}", receipt_id).as_str()
    );

    let receipt_uri = format!("/api/v1/receiving/{}", receipt_id);
    let (status, _, _) = send_raw(&app, Method::PUT, &receipt_uri, Some(delivery)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, detail) = send(&app, Method::GET, &format!("/api/v1/items/{}", item), None).await;
    assert_eq!(detail["quantity_in_stock"], 7);
}

#[tokio::test]
async fn test_rejected_count_returns_form() {
    let app = app();
    let item = create_item(&app, "Cups", 50).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/counts",
        Some(json!({
            "filter": "Full",
            "items": [{ "item": item, "quantity": "lots" }],
            "submit_type": "submit"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "items[0].quantity");
    assert_eq!(body["sheet"]["lines"][0]["name"], "Cups");

    let (status, body) = send(&app, Method::GET, "/api/v1/counts?filter=unsubmitted", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_count_sheet_unknown_category() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/counts/sheet?filter=Pastries", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

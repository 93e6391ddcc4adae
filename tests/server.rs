//! # HTTP API Tests
//!
//! Drives the router in-process over an in-memory store.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use pricetag::barcode::BarcodeMode;
use pricetag::server::{AppState, ServerConfig, router};
use pricetag::store::{MemoryStore, SharedStore};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn app(mode: BarcodeMode) -> Router {
    let config = ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        store_dir: "unused".into(),
        barcode_mode: mode,
    };
    let store: SharedStore = Arc::new(MemoryStore::new());
    router(Arc::new(AppState::with_store(config, store)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// ============================================================================
// LABELS
// ============================================================================

#[tokio::test]
async fn test_labels_endpoint_renders_copies() {
    let app = app(BarcodeMode::PerProduct);
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/labels",
        Some(json!({"name": "Soap", "variation": "Lavender", "labelCount": "3"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let labels = body["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 3);
    let barcode = body["barcode"].as_str().unwrap();
    assert_eq!(barcode.len(), 8);
    assert_eq!(labels[0]["nodes"][0]["kind"], "text");
    assert_eq!(labels[0]["nodes"][0]["text"], "Soap");
}

#[tokio::test]
async fn test_preview_returns_png() {
    let app = app(BarcodeMode::PerProduct);
    let (status, bytes) = send(
        &app,
        "POST",
        "/api/preview?scale=1&columns=2",
        Some(json!({"name": "Soap", "labelCount": "2"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_non_object_form_is_rejected() {
    let app = app(BarcodeMode::PerProduct);
    let (status, _) = send(&app, "POST", "/api/labels", Some(json!([1, 2, 3]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_counts_and_sizes_are_capped() {
    let app = app(BarcodeMode::PerProduct);
    let form = json!({
        "name": "Soap",
        "labelCount": "1000000000",
        "labelSize": "100000x100000",
        "fonts": {"name": "99999999"},
    });

    let (status, body) = send_json(&app, "POST", "/api/labels", Some(form.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labels"].as_array().unwrap().len(), 500);
    assert_eq!(body["data"]["labelSize"], "38x25");

    let (status, _) = send(&app, "POST", "/api/preview?scale=8&columns=1", Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkbox_text_is_accepted() {
    let app = app(BarcodeMode::PerProduct);
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/labels",
        Some(json!({
            "name": "Soap",
            "price": "80",
            "boldText": "on",
            "show": {"price": "false", "biz": "true"},
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let label = &body["labels"][0];
    assert_eq!(label["boldText"], true);
    let texts: Vec<&str> = label["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["text"].as_str())
        .collect();
    assert!(!texts.iter().any(|t| t.starts_with("Price")), "{:?}", texts);
}

#[tokio::test]
async fn test_print_returns_page_directive_and_advances_sequence() {
    let app = app(BarcodeMode::Sequential);
    let form = json!({"name": "Soap", "labelCount": "2", "labelSize": "50x30"});

    let (status, job) = send_json(&app, "POST", "/api/print", Some(form.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["page"]["css"], "@page{ size: 50mm 30mm; margin:0 }");
    assert_eq!(job["barcode"], "00000001");

    let (_, next) = send_json(&app, "POST", "/api/labels", Some(form)).await;
    assert_eq!(next["barcode"], "00000003");
}

// ============================================================================
// SETTINGS
// ============================================================================

#[tokio::test]
async fn test_settings_patch_keeps_other_sections() {
    let app = app(BarcodeMode::PerProduct);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/settings/barcode",
        Some(json!({"labelSize": "50x30", "type": "ean13", "height": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = send_json(
        &app,
        "PATCH",
        "/api/settings",
        Some(json!({"bizName": "Corner Shop"})),
    )
    .await;
    assert_eq!(settings["bizName"], "Corner Shop");
    assert_eq!(settings["labelSize"], "50x30");
    assert_eq!(settings["barcode"]["type"], "ean13");

    let (_, settings) = send_json(&app, "DELETE", "/api/settings/barcode", None).await;
    assert_eq!(settings["bizName"], "Corner Shop");
    assert_eq!(settings["barcode"]["type"], "code128");
}

#[tokio::test]
async fn test_toggles() {
    let app = app(BarcodeMode::PerProduct);

    let (_, bold) = send_json(&app, "POST", "/api/settings/bold-text", None).await;
    assert_eq!(bold, json!({"boldTextActive": true}));
    let (_, theme) = send_json(&app, "POST", "/api/settings/theme", None).await;
    assert_eq!(theme, json!({"theme": "light"}));

    let (_, form) = send_json(&app, "GET", "/api/form", None).await;
    assert_eq!(form["boldText"], true);
}

// ============================================================================
// PRODUCTS
// ============================================================================

#[tokio::test]
async fn test_product_lifecycle() {
    let app = app(BarcodeMode::PerProduct);

    let (status, product) = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({"name": "Rice", "variation": "Miniket", "price": "75"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = product["id"].as_str().unwrap().to_string();

    let (_, list) = send_json(&app, "GET", "/api/products?search=mini", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send_json(&app, "GET", "/api/products/last", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, used) = send_json(&app, "POST", &format!("/api/products/{}/use", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(used["form"]["name"], "Rice");
    assert_eq!(used["form"]["price"], "75");

    let (status, _) = send(&app, "DELETE", &format!("/api/products/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/products/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = app(BarcodeMode::PerProduct);
    let (status, _) = send(&app, "POST", "/api/products/nope/use", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/api/products/last", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// UNITS
// ============================================================================

#[tokio::test]
async fn test_unit_menu_follows_digits() {
    let app = app(BarcodeMode::PerProduct);

    let (_, english) = send_json(&app, "GET", "/api/units?qty=2&current=custom", None).await;
    assert_eq!(english["selected"], "custom");
    assert_eq!(english["options"][0]["caption"], "Gram");

    let (_, bengali) = send_json(&app, "GET", "/api/units?qty=%E0%A7%A8&current=custom", None).await;
    assert_eq!(bengali["selected"], "custom");
    assert_ne!(english["options"], bengali["options"]);
}

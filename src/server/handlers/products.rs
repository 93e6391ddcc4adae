//! Saved-product handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiResult, api_error};
use crate::normalize::RawForm;
use crate::server::state::AppState;
use crate::store::Product;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
}

/// Response of POST /api/products/:id/use.
#[derive(Debug, Serialize)]
pub struct UsedProduct {
    pub product: Product,
    pub form: RawForm,
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Product not found: {}", id))
}

/// Handle GET /api/products?search=
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Product>> {
    let engine = state.engine.lock().await;
    Json(engine.products().list(&query.search))
}

/// Handle POST /api/products - save the posted form as a product.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let engine = state.engine.lock().await;
    let form = engine.form_from_json(&body).map_err(api_error)?;
    let product = engine.save_product(&form).map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Handle DELETE /api/products
pub async fn clear(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    let engine = state.engine.lock().await;
    engine.products().clear().map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /api/products/last
pub async fn last(State(state): State<Arc<AppState>>) -> ApiResult<Json<Product>> {
    let engine = state.engine.lock().await;
    engine
        .products()
        .last_used()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No product used yet".to_string()))
}

/// Handle DELETE /api/products/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let engine = state.engine.lock().await;
    if engine.products().delete(&id).map_err(api_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

/// Handle POST /api/products/:id/use
///
/// The body is the current form (or nothing); the product is loaded into
/// it and remembered as the last used one.
pub async fn use_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<UsedProduct>> {
    let engine = state.engine.lock().await;
    let overrides = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let mut form = engine.form_from_json(&overrides).map_err(api_error)?;
    match engine.use_product(&id, &mut form).map_err(api_error)? {
        Some(product) => Ok(Json(UsedProduct { product, form })),
        None => Err(not_found(&id)),
    }
}

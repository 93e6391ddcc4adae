//! Label preview, render and print handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiResult, api_error};
use crate::normalize::RawForm;
use crate::preview::{PreviewOptions, render_sheet};
use crate::render::{PrintJob, RenderPass};
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub scale: Option<usize>,
    pub columns: Option<usize>,
}

/// Handle GET /api/form - the startup form (settings plus last product).
pub async fn initial_form(State(state): State<Arc<AppState>>) -> Json<RawForm> {
    let engine = state.engine.lock().await;
    Json(engine.initial_form())
}

/// Handle POST /api/preview - render the form as a PNG sheet.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let pass = {
        let engine = state.engine.lock().await;
        let form = engine.form_from_json(&body).map_err(api_error)?;
        engine.preview(&form).map_err(api_error)?
    };

    let defaults = PreviewOptions::default();
    let options = PreviewOptions {
        scale: query.scale.unwrap_or(defaults.scale).clamp(1, 8),
        columns: query.columns.unwrap_or(defaults.columns).max(1),
        ..defaults
    };
    let png_bytes = render_sheet(&pass.labels, &options).map_err(api_error)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// Handle POST /api/labels - render the form as label descriptors.
pub async fn labels(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<RenderPass>> {
    let engine = state.engine.lock().await;
    let form = engine.form_from_json(&body).map_err(api_error)?;
    engine.preview(&form).map(Json).map_err(api_error)
}

/// Handle POST /api/form-changed - persist form-level settings, then render.
pub async fn form_changed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<RenderPass>> {
    let engine = state.engine.lock().await;
    let form = engine.form_from_json(&body).map_err(api_error)?;
    engine.form_changed(&form).map(Json).map_err(api_error)
}

/// Handle POST /api/print - page directive plus labels to print.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<PrintJob>> {
    let engine = state.engine.lock().await;
    let form = engine.form_from_json(&body).map_err(api_error)?;
    engine.print(&form).map(Json).map_err(api_error)
}

//! Settings handlers. Every write is a merge patch, so each section can be
//! saved or reset without touching the others.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ApiResult, api_error};
use crate::label::{BarcodeType, FontSizes, LabelSize, ShowFlags};
use crate::server::state::AppState;
use crate::store::{Settings, SettingsPatch};

/// Body of POST /api/settings/display.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayBody {
    #[serde(default)]
    pub show: ShowFlags,
    #[serde(default)]
    pub fonts: FontSizes,
    #[serde(default)]
    pub biz_name: String,
}

/// Body of POST /api/settings/barcode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeBody {
    #[serde(default)]
    pub label_size: LabelSize,
    #[serde(rename = "type", default)]
    pub kind: BarcodeType,
    pub height: Option<u32>,
}

async fn apply(state: &AppState, patch: SettingsPatch) -> ApiResult<Json<Settings>> {
    let engine = state.engine.lock().await;
    engine.settings().patch(&patch).map(Json).map_err(api_error)
}

/// Handle GET /api/settings
pub async fn get(State(state): State<Arc<AppState>>) -> Json<Settings> {
    let engine = state.engine.lock().await;
    Json(engine.settings().load())
}

/// Handle PATCH /api/settings - arbitrary merge patch.
pub async fn patch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Settings>> {
    if !body.is_object() {
        return Err((
            StatusCode::BAD_REQUEST,
            "settings patch must be a JSON object".to_string(),
        ));
    }
    apply(&state, SettingsPatch::from_value(body)).await
}

/// Handle DELETE /api/settings
pub async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<Json<Settings>> {
    let engine = state.engine.lock().await;
    engine.settings().reset().map(Json).map_err(api_error)
}

/// Handle POST /api/settings/display
pub async fn save_display(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DisplayBody>,
) -> ApiResult<Json<Settings>> {
    let patch = SettingsPatch::display(&body.show, &body.fonts, body.biz_name.trim());
    apply(&state, patch).await
}

/// Handle DELETE /api/settings/display
pub async fn reset_display(State(state): State<Arc<AppState>>) -> ApiResult<Json<Settings>> {
    apply(&state, SettingsPatch::reset_display()).await
}

/// Handle POST /api/settings/barcode
pub async fn save_barcode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BarcodeBody>,
) -> ApiResult<Json<Settings>> {
    let height = body.height.filter(|h| *h > 0).unwrap_or(15);
    apply(&state, SettingsPatch::barcode(body.label_size, body.kind, height)).await
}

/// Handle DELETE /api/settings/barcode
pub async fn reset_barcode(State(state): State<Arc<AppState>>) -> ApiResult<Json<Settings>> {
    apply(&state, SettingsPatch::reset_barcode()).await
}

/// Handle POST /api/settings/bold-text
pub async fn toggle_bold_text(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let engine = state.engine.lock().await;
    let active = engine.settings().toggle_bold_text().map_err(api_error)?;
    Ok(Json(json!({ "boldTextActive": active })))
}

/// Handle POST /api/settings/theme
pub async fn toggle_theme(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let engine = state.engine.lock().await;
    let theme = engine.settings().toggle_theme().map_err(api_error)?;
    Ok(Json(json!({ "theme": theme })))
}

/// Handle POST /api/settings/preset/rongta-3825
pub async fn rongta_preset(State(state): State<Arc<AppState>>) -> ApiResult<Json<Settings>> {
    apply(&state, SettingsPatch::rongta_3825_sample()).await
}

//! Quantity-unit menu handler.

use axum::{Json, extract::Query};
use serde::Deserialize;

use crate::locale::UnitMenu;

#[derive(Debug, Default, Deserialize)]
pub struct UnitQuery {
    #[serde(default)]
    pub qty: String,
    #[serde(default)]
    pub current: String,
}

/// Handle GET /api/units?qty=&current=
pub async fn menu(Query(query): Query<UnitQuery>) -> Json<UnitMenu> {
    Json(UnitMenu::for_quantity(&query.qty, &query.current))
}

//! HTTP handlers for the server.

pub mod labels;
pub mod products;
pub mod settings;
pub mod units;

use axum::http::StatusCode;

use crate::error::PricetagError;

pub type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Map an engine error onto a status code.
pub fn api_error(e: PricetagError) -> (StatusCode, String) {
    let status = match e {
        PricetagError::InvalidInput(_) | PricetagError::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(status = %status, error = %e, "request failed");
    (status, e.to_string())
}

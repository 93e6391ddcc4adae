//! # HTTP Server for Label Rendering
//!
//! JSON API over the label engine and its stores.
//!
//! ## Usage
//!
//! ```bash
//! pricetag serve --listen 0.0.0.0:8080 --store ./labels
//! ```
//!
//! Forms are posted in their JSON shape (`name`, `qty`, `labelSize`, ...);
//! any key left out is filled from the stored settings.

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::{PricetagError, Result};

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Labels
        .route("/api/form", get(handlers::labels::initial_form))
        .route("/api/preview", post(handlers::labels::preview))
        .route("/api/labels", post(handlers::labels::labels))
        .route("/api/form-changed", post(handlers::labels::form_changed))
        .route("/api/print", post(handlers::labels::print))
        // Settings
        .route(
            "/api/settings",
            get(handlers::settings::get)
                .patch(handlers::settings::patch)
                .delete(handlers::settings::reset),
        )
        .route(
            "/api/settings/display",
            post(handlers::settings::save_display).delete(handlers::settings::reset_display),
        )
        .route(
            "/api/settings/barcode",
            post(handlers::settings::save_barcode).delete(handlers::settings::reset_barcode),
        )
        .route("/api/settings/bold-text", post(handlers::settings::toggle_bold_text))
        .route("/api/settings/theme", post(handlers::settings::toggle_theme))
        .route(
            "/api/settings/preset/rongta-3825",
            post(handlers::settings::rongta_preset),
        )
        // Saved products
        .route(
            "/api/products",
            get(handlers::products::list)
                .post(handlers::products::save)
                .delete(handlers::products::clear),
        )
        .route("/api/products/last", get(handlers::products::last))
        .route("/api/products/:id", delete(handlers::products::remove))
        .route("/api/products/:id/use", post(handlers::products::use_product))
        // Units
        .route("/api/units", get(handlers::units::menu))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use pricetag::barcode::BarcodeMode;
/// use pricetag::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), pricetag::error::PricetagError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     store_dir: ".pricetag".into(),
///     barcode_mode: BarcodeMode::PerProduct,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone())?);
    let app = router(state);

    tracing::info!(
        listen = %config.listen_addr,
        store = %config.store_dir.display(),
        barcode_mode = %config.barcode_mode,
        "pricetag HTTP server starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            PricetagError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PricetagError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

//! # Pricetag - Price Label Rendering Engine
//!
//! Pricetag turns a loosely typed product form (name, quantity, price,
//! dates, barcode) into fully laid out price labels for small thermal
//! label printers. It provides:
//!
//! - **Normalization**: raw form text in, well-formed label data out, never an error
//! - **Localization**: English/Bengali captions and numerals
//! - **Layout**: proportional auto-scaling so every row fits the label
//! - **Barcodes**: per-product or sequential values, Code128/EAN-13/UPC-A symbols
//! - **Persistence**: settings and saved products over a key-value store
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pricetag::{
//!     barcode::BarcodeMode,
//!     render::LabelEngine,
//!     store::{JsonFileStore, SharedStore},
//! };
//!
//! let store: SharedStore = Arc::new(JsonFileStore::open(".pricetag")?);
//! let engine = LabelEngine::new(store, BarcodeMode::PerProduct);
//!
//! let form = engine.form_from_json(&serde_json::json!({
//!     "name": "Soap",
//!     "variation": "Lavender",
//!     "price": "50",
//!     "labelCount": "3",
//! }))?;
//!
//! let job = engine.print(&form)?;
//! println!("{} labels, {}", job.pass.labels.len(), job.page.to_css());
//!
//! # Ok::<(), pricetag::error::PricetagError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`normalize`] | Raw form to [`label::LabelData`] |
//! | [`locale`] | Language detection, captions, unit menu |
//! | [`barcode`] | Barcode value resolvers and symbol encoding |
//! | [`layout`] | Auto-scale of fonts and barcode height |
//! | [`render`] | Label descriptors and the render/print engine |
//! | [`preview`] | PNG previews of label descriptors |
//! | [`print`] | Page directive for the print surface |
//! | [`store`] | Settings and saved products |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod barcode;
pub mod error;
pub mod label;
pub mod layout;
pub mod locale;
pub mod normalize;
pub mod preview;
pub mod print;
pub mod render;
pub mod server;
pub mod store;

// Re-exports for convenience
pub use error::PricetagError;
pub use label::LabelData;
pub use render::LabelEngine;

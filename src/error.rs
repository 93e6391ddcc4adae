//! # Error Types
//!
//! This module defines error types used throughout the pricetag library.
//!
//! Bad user input never shows up here: the normalizer folds it into safe
//! defaults. What remains are boundary failures (storage writes, image
//! encoding, the HTTP listener) and barcode symbol failures, which the
//! renderer recovers from locally.

use thiserror::Error;

/// Main error type for pricetag operations
#[derive(Debug, Error)]
pub enum PricetagError {
    /// Barcode symbol could not be drawn for this type/value combination
    #[error("Symbol error: {0}")]
    Symbol(String),

    /// Image processing or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// HTTP server error (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// Input rejected at a boundary (CLI/HTTP), never from the normalizer
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PricetagError>;

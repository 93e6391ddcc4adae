//! # Label Record
//!
//! The canonical [`LabelData`] record every render pass works from, plus the
//! small typed pieces it is built of (fields, visibility flags, font sizes,
//! physical size, units, barcode settings).

mod types;

pub use types::*;

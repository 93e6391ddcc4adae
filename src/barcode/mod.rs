//! # Barcodes
//!
//! Two separate concerns live here:
//!
//! - **Value resolution** ([`resolver`]): which value a label carries, and how
//!   auto-generated values stay stable per product.
//! - **Symbol drawing** ([`symbol`]): turning a value into bar modules for a
//!   given symbology. Drawing can fail (a letter in an EAN-13, a bad check
//!   digit); the renderer shows a placeholder instead.

pub mod resolver;
pub mod symbol;

pub use resolver::{
    BarcodeMode, BarcodeValueResolver, PerProductResolver, ProductKey, SequentialResolver,
    resolver_for,
};
pub use symbol::{BarcodersRenderer, Symbol, SymbolOptions, SymbolRenderer};

//! Barcode symbol drawing via the barcoders crate.
//!
//! A [`Symbol`] is the module pattern (true = bar) plus the human-readable
//! text printed under it. Pixel painting happens in the preview module.

use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::EAN13;
use serde::Serialize;

use crate::error::{PricetagError, Result};
use crate::label::{BarcodeSpec, BarcodeType};

/// Drawing options handed to a [`SymbolRenderer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolOptions {
    pub format: BarcodeType,
    /// Bar height in pixels.
    pub height: u32,
    /// Module width in pixels.
    pub width: f32,
    pub display_value: bool,
    pub font_size: u32,
    pub margin: u32,
    pub line_color: String,
    pub background: String,
    pub font: String,
}

impl SymbolOptions {
    /// Options used on labels: thin modules, value shown, no margin.
    pub fn for_label(format: BarcodeType, height: u32) -> Self {
        Self {
            format,
            height,
            width: 1.2,
            display_value: true,
            font_size: 10,
            margin: 0,
            line_color: "#000".into(),
            background: "#fff".into(),
            font: "monospace".into(),
        }
    }

    pub fn for_spec(spec: &BarcodeSpec) -> Self {
        Self::for_label(spec.kind, spec.height_px)
    }
}

/// An encoded barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// One entry per module, `true` = bar.
    pub modules: Vec<bool>,
    /// Human-readable text (includes the computed check digit for EAN/UPC).
    pub text: String,
}

/// Draws a barcode symbol for a value.
pub trait SymbolRenderer: Send + Sync {
    fn draw(&self, value: &str, options: &SymbolOptions) -> Result<Symbol>;
}

/// [`SymbolRenderer`] backed by barcoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarcodersRenderer;

impl SymbolRenderer for BarcodersRenderer {
    fn draw(&self, value: &str, options: &SymbolOptions) -> Result<Symbol> {
        match options.format {
            BarcodeType::Code128 => encode_code128(value),
            BarcodeType::Ean13 => encode_ean13(value),
            BarcodeType::Upc => encode_upca(value),
        }
    }
}

fn symbol_error(kind: BarcodeType, value: &str, why: impl std::fmt::Display) -> PricetagError {
    PricetagError::Symbol(format!("{} '{}': {}", kind.format_name(), value, why))
}

fn to_modules(encoded: &[u8]) -> Vec<bool> {
    encoded.iter().map(|&m| m == 1).collect()
}

fn encode_code128(value: &str) -> Result<Symbol> {
    if value.is_empty() {
        return Err(symbol_error(BarcodeType::Code128, value, "empty value"));
    }
    // Character set B covers printable ASCII.
    let prefixed = format!("\u{0181}{}", value);
    let barcode = Code128::new(&prefixed)
        .map_err(|e| symbol_error(BarcodeType::Code128, value, e))?;
    Ok(Symbol {
        modules: to_modules(&barcode.encode()),
        text: value.to_string(),
    })
}

/// EAN-13 check digit for a 12-digit body.
fn ean_check_digit(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn digits(value: &str) -> Option<Vec<u8>> {
    value
        .chars()
        .map(|c| c.to_digit(10).filter(|_| c.is_ascii()).map(|d| d as u8))
        .collect()
}

/// Encode a 12-digit EAN body (check digit is appended by barcoders).
fn encode_ean_body(kind: BarcodeType, value: &str, body: &[u8], text: String) -> Result<Symbol> {
    let data: String = body.iter().map(|d| char::from(b'0' + d)).collect();
    let barcode = EAN13::new(&data).map_err(|e| symbol_error(kind, value, e))?;
    Ok(Symbol {
        modules: to_modules(&barcode.encode()),
        text,
    })
}

fn encode_ean13(value: &str) -> Result<Symbol> {
    let kind = BarcodeType::Ean13;
    let ds = digits(value).ok_or_else(|| symbol_error(kind, value, "digits only"))?;
    match ds.len() {
        12 => {
            let check = ean_check_digit(&ds);
            encode_ean_body(kind, value, &ds, format!("{}{}", value, check))
        }
        13 => {
            if ean_check_digit(&ds[..12]) != ds[12] {
                return Err(symbol_error(kind, value, "bad check digit"));
            }
            encode_ean_body(kind, value, &ds[..12], value.to_string())
        }
        n => Err(symbol_error(kind, value, format!("expected 12 or 13 digits, got {}", n))),
    }
}

/// UPC-A is EAN-13 with a leading zero.
fn encode_upca(value: &str) -> Result<Symbol> {
    let kind = BarcodeType::Upc;
    let ds = digits(value).ok_or_else(|| symbol_error(kind, value, "digits only"))?;
    let mut body = Vec::with_capacity(12);
    body.push(0);
    match ds.len() {
        11 => {
            body.extend_from_slice(&ds);
            let check = ean_check_digit(&body);
            encode_ean_body(kind, value, &body, format!("{}{}", value, check))
        }
        12 => {
            body.extend_from_slice(&ds[..11]);
            if ean_check_digit(&body) != ds[11] {
                return Err(symbol_error(kind, value, "bad check digit"));
            }
            encode_ean_body(kind, value, &body, value.to_string())
        }
        n => Err(symbol_error(kind, value, format!("expected 11 or 12 digits, got {}", n))),
    }
}

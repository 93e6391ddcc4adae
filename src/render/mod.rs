//! # Label Rendering
//!
//! Turns a resolved [`LabelData`] into a [`LabelDescriptor`]: a plain data
//! tree of text rows and a barcode symbol, ready for any paint adapter
//! (see [`crate::preview`]).
//!
//! ## Pipeline
//!
//! ```text
//! RawForm → normalize → LabelData
//!                          ↓ resolve barcode value (once per pass)
//!                       render × labelCount
//!                          ↓ captions, symbol, layout
//!                       LabelDescriptor
//! ```
//!
//! [`render`] is pure: same data in, same descriptor out. The stateful parts
//! (settings, saved products, barcode resolution) live in [`LabelEngine`].
//!
//! ## Example
//!
//! ```
//! use pricetag::barcode::BarcodersRenderer;
//! use pricetag::label::LabelData;
//! use pricetag::render::render;
//!
//! let mut data = LabelData::default();
//! data.name = "Soap".into();
//! data.barcode.value = "12345678".into();
//!
//! let label = render(&data, &BarcodersRenderer);
//! assert!(label.barcode().is_some());
//! ```

mod engine;

pub use engine::{LabelEngine, PrintJob, RenderPass};

use serde::Serialize;

use crate::barcode::{BarcodeValueResolver, Symbol, SymbolOptions, SymbolRenderer};
use crate::error::{PricetagError, Result};
use crate::label::{Field, LabelData, MAX_LABEL_COUNT};
use crate::layout::{Row, RowKind, Span, compute_layout};
use crate::locale::Language;

/// One drawable element, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    Text {
        field: Field,
        text: String,
        size: u32,
        bold: bool,
    },
    /// Packaging and/or expiry, with a separator between them.
    DateRow { spans: Vec<Span> },
    Barcode {
        value: String,
        symbol: Symbol,
        options: SymbolOptions,
    },
    /// Stands in for a barcode that could not be drawn.
    Placeholder { reason: String },
}

/// A fully laid out label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDescriptor {
    pub width_mm: f64,
    pub height_mm: f64,
    pub width_px: f64,
    pub height_px: f64,
    pub language: Language,
    /// Whole-label bold emphasis.
    pub bold_text: bool,
    /// Auto-scale factor (1.0 when nothing had to shrink).
    pub scale: f64,
    pub nodes: Vec<Node>,
}

impl LabelDescriptor {
    /// Text of a single-field node, if shown.
    pub fn text(&self, field: Field) -> Option<&str> {
        self.nodes.iter().find_map(|n| match n {
            Node::Text { field: f, text, .. } if *f == field => Some(text.as_str()),
            Node::DateRow { spans } => spans
                .iter()
                .find(|s| s.field == Some(field))
                .map(|s| s.text.as_str()),
            _ => None,
        })
    }

    /// Value carried by the barcode symbol, if one was drawn.
    pub fn barcode(&self) -> Option<&str> {
        self.nodes.iter().find_map(|n| match n {
            Node::Barcode { value, .. } => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn has_placeholder(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, Node::Placeholder { .. }))
    }
}

fn row_node(row: Row) -> Option<Node> {
    if row.kind == RowKind::Dates {
        return Some(Node::DateRow { spans: row.spans });
    }
    let bold = row.kind == RowKind::Business;
    let span = row.spans.into_iter().next()?;
    Some(Node::Text {
        field: span.field?,
        text: span.text,
        size: span.size,
        bold,
    })
}

/// Render one label. `data.barcode.value` must already be resolved.
///
/// A symbol that fails to draw becomes [`Node::Placeholder`]; the rest of
/// the label renders regardless.
pub fn render(data: &LabelData, symbols: &dyn SymbolRenderer) -> LabelDescriptor {
    let language = data.language;
    let captions = language.captions();

    let options = SymbolOptions::for_spec(&data.barcode);
    let symbol = symbols.draw(&data.barcode.value, &options);
    if let Err(e) = &symbol {
        tracing::warn!(error = %e, "barcode not drawable, using placeholder");
    }

    let layout = compute_layout(data, &captions, symbol.is_ok());

    let mut nodes: Vec<Node> = layout.rows.iter().cloned().filter_map(row_node).collect();
    nodes.push(match symbol {
        Ok(symbol) => Node::Barcode {
            value: data.barcode.value.clone(),
            symbol,
            options: SymbolOptions {
                height: layout.barcode_height.unwrap_or(options.height),
                ..options
            },
        },
        Err(e) => Node::Placeholder {
            reason: e.to_string(),
        },
    });

    LabelDescriptor {
        width_mm: data.label_size.width_mm,
        height_mm: data.label_size.height_mm,
        width_px: layout.width_px,
        height_px: layout.height_px,
        language,
        bold_text: data.bold_text,
        scale: layout.scale,
        nodes,
    }
}

/// Resolve the barcode once and render `data.label_count` copies.
///
/// Returns the resolved base value alongside the labels.
pub fn render_copies(
    data: &LabelData,
    resolver: &dyn BarcodeValueResolver,
    symbols: &dyn SymbolRenderer,
) -> Result<(String, Vec<LabelDescriptor>)> {
    if data.label_count > MAX_LABEL_COUNT {
        return Err(PricetagError::InvalidInput(format!(
            "{} labels requested, at most {} per pass",
            data.label_count, MAX_LABEL_COUNT
        )));
    }
    let base = resolver.resolve(&data.product_key(), &data.barcode.value)?;

    let mut copy = data.clone();
    let mut labels: Vec<LabelDescriptor> = Vec::with_capacity(data.label_count as usize);
    for i in 0..data.label_count {
        let value = resolver.value_for_copy(&base, i);
        match labels.last() {
            Some(prev) if copy.barcode.value == value => labels.push(prev.clone()),
            _ => {
                copy.barcode.value = value;
                labels.push(render(&copy, symbols));
            }
        }
    }
    Ok((base, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::{BarcodersRenderer, PerProductResolver, SequentialResolver};
    use crate::error::PricetagError;
    use crate::label::{BarcodeType, ShowFlags};
    use crate::store::{MemoryStore, SharedStore};
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct FailingSymbols;

    impl SymbolRenderer for FailingSymbols {
        fn draw(&self, _value: &str, _options: &SymbolOptions) -> Result<Symbol> {
            Err(PricetagError::Symbol("always fails".into()))
        }
    }

    fn soap() -> LabelData {
        let mut data = LabelData {
            name: "Soap".into(),
            variation: "Lavender".into(),
            price: 80.0,
            business_name: "Acme".into(),
            ..Default::default()
        };
        data.barcode.value = "12345678".into();
        data
    }

    fn store() -> SharedStore {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn test_node_order() {
        let label = render(&soap(), &BarcodersRenderer);
        let kinds: Vec<&str> = label
            .nodes
            .iter()
            .map(|n| match n {
                Node::Text { field, .. } => field.key(),
                Node::DateRow { .. } => "dates",
                Node::Barcode { .. } => "barcode",
                Node::Placeholder { .. } => "placeholder",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["biz", "name", "variation", "qty", "price", "dates", "barcode"]
        );
    }

    #[test]
    fn test_business_is_bold() {
        let label = render(&soap(), &BarcodersRenderer);
        let bold: Vec<bool> = label
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Text { bold, .. } => Some(*bold),
                _ => None,
            })
            .collect();
        assert_eq!(bold, vec![true, false, false, false, false]);
    }

    #[test]
    fn test_hidden_business_is_absent() {
        let mut data = soap();
        data.show.business = false;
        let label = render(&data, &BarcodersRenderer);
        assert_eq!(label.text(Field::Business), None);
    }

    #[test]
    fn test_symbol_failure_becomes_placeholder() {
        let label = render(&soap(), &FailingSymbols);
        assert!(label.has_placeholder());
        assert_eq!(label.barcode(), None);
        assert_eq!(label.text(Field::Name), Some("Soap"));
    }

    #[test]
    fn test_invalid_ean_becomes_placeholder() {
        let mut data = soap();
        data.barcode.kind = BarcodeType::Ean13;
        data.barcode.value = "SOAP".into();
        let label = render(&data, &BarcodersRenderer);
        assert!(label.has_placeholder());
    }

    #[test]
    fn test_captions_follow_record_language() {
        let mut data = soap();
        data.name = "সাবান".into();
        data.language = Language::Bengali;
        let label = render(&data, &BarcodersRenderer);
        assert_eq!(label.language, Language::Bengali);
        assert_eq!(label.text(Field::Price), Some("দাম: 80৳"));
    }

    #[test]
    fn test_typed_price_is_printed_verbatim() {
        let mut data = soap();
        data.price = 12.5;
        data.price_display = "12.50".into();
        let label = render(&data, &BarcodersRenderer);
        assert_eq!(label.text(Field::Price), Some("Price: 12.50৳"));
    }

    #[test]
    fn test_oversized_copy_count_is_rejected() {
        let resolver = PerProductResolver::new(store());
        let mut data = soap();
        data.label_count = u32::MAX;
        let err = render_copies(&data, &resolver, &BarcodersRenderer).unwrap_err();
        assert!(matches!(err, PricetagError::InvalidInput(_)));
    }

    #[test]
    fn test_expiry_reads_formatted_date() {
        let mut data = soap();
        data.show = ShowFlags {
            pack_date: false,
            exp_date: false,
            ..Default::default()
        };
        assert_eq!(render(&data, &BarcodersRenderer).text(Field::ExpDate), None);

        data.exp_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let label = render(&data, &BarcodersRenderer);
        assert_eq!(label.text(Field::ExpDate), Some("EXP: 01/01/2025"));
    }

    #[test]
    fn test_render_is_pure() {
        let data = soap();
        assert_eq!(render(&data, &BarcodersRenderer), render(&data, &BarcodersRenderer));
    }

    #[test]
    fn test_copies_share_per_product_value() {
        let resolver = PerProductResolver::new(store());
        let mut data = soap();
        data.barcode.value.clear();
        data.label_count = 3;

        let (base, labels) = render_copies(&data, &resolver, &BarcodersRenderer).unwrap();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|l| l.barcode() == Some(base.as_str())));
    }

    #[test]
    fn test_sequential_copies_count_up() {
        let resolver = SequentialResolver::new(store());
        let mut data = soap();
        data.barcode.value = "0041".into();
        data.label_count = 3;

        let (base, labels) = render_copies(&data, &resolver, &BarcodersRenderer).unwrap();
        assert_eq!(base, "0041");
        let values: Vec<&str> = labels.iter().filter_map(|l| l.barcode()).collect();
        assert_eq!(values, vec!["0041", "0042", "0043"]);
    }
}

//! Typed label record and its building blocks.
//!
//! All types derive `Serialize + Deserialize` with the camelCase keys used in
//! persisted settings and products, so the same types serve the Rust API,
//! the HTTP API and the storage layer.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::barcode::ProductKey;
use crate::error::PricetagError;
use crate::locale::Language;

// ============================================================================
// FIELDS
// ============================================================================

/// A user-visible field on the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Variation,
    Qty,
    Price,
    Business,
    PackDate,
    ExpDate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::Variation,
        Field::Qty,
        Field::Price,
        Field::Business,
        Field::PackDate,
        Field::ExpDate,
    ];

    /// Key used for this field in persisted `show`/`fonts` objects.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Variation => "variation",
            Field::Qty => "qty",
            Field::Price => "price",
            Field::Business => "biz",
            Field::PackDate => "pack",
            Field::ExpDate => "exp",
        }
    }
}

/// Checkbox state as browsers and older saves send it: a JSON bool, a
/// number, or text such as `"on"`, `"true"` or `"0"`. `None` when the value
/// says nothing either way.
fn parse_flag(value: &serde_json::Value) -> Option<bool> {
    use serde_json::Value;
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" | "checked" => Some(true),
            "false" | "off" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Flag that reads as on unless the input clearly says off.
pub(crate) fn flag_default_on<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_flag(&value).unwrap_or(true))
}

/// Flag that reads as off unless the input clearly says on.
pub(crate) fn flag_default_off<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_flag(&value).unwrap_or(false))
}

/// Per-field visibility toggles. Every field is shown by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowFlags {
    #[serde(deserialize_with = "flag_default_on")]
    pub name: bool,
    #[serde(deserialize_with = "flag_default_on")]
    pub variation: bool,
    #[serde(deserialize_with = "flag_default_on")]
    pub qty: bool,
    #[serde(deserialize_with = "flag_default_on")]
    pub price: bool,
    #[serde(rename = "biz", alias = "business", deserialize_with = "flag_default_on")]
    pub business: bool,
    #[serde(rename = "pack", alias = "packDate", deserialize_with = "flag_default_on")]
    pub pack_date: bool,
    #[serde(rename = "exp", alias = "expDate", deserialize_with = "flag_default_on")]
    pub exp_date: bool,
}

impl Default for ShowFlags {
    fn default() -> Self {
        Self {
            name: true,
            variation: true,
            qty: true,
            price: true,
            business: true,
            pack_date: true,
            exp_date: true,
        }
    }
}

impl ShowFlags {
    pub fn get(&self, field: Field) -> bool {
        match field {
            Field::Name => self.name,
            Field::Variation => self.variation,
            Field::Qty => self.qty,
            Field::Price => self.price,
            Field::Business => self.business,
            Field::PackDate => self.pack_date,
            Field::ExpDate => self.exp_date,
        }
    }

    pub fn set(&mut self, field: Field, on: bool) {
        match field {
            Field::Name => self.name = on,
            Field::Variation => self.variation = on,
            Field::Qty => self.qty = on,
            Field::Price => self.price = on,
            Field::Business => self.business = on,
            Field::PackDate => self.pack_date = on,
            Field::ExpDate => self.exp_date = on,
        }
    }
}

/// Base font size in pixels for each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub name: u32,
    pub variation: u32,
    pub qty: u32,
    pub price: u32,
    #[serde(rename = "biz", alias = "business")]
    pub business: u32,
    #[serde(rename = "pack", alias = "packDate")]
    pub pack_date: u32,
    #[serde(rename = "exp", alias = "expDate")]
    pub exp_date: u32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            name: 11,
            variation: 6,
            qty: 7,
            price: 10,
            business: 7,
            pack_date: 9,
            exp_date: 9,
        }
    }
}

impl FontSizes {
    /// Font sizes matching the Rongta 38x25 sample sticker.
    pub const RONGTA_3825_SAMPLE: Self = Self {
        name: 6,
        variation: 6,
        qty: 10,
        price: 8,
        business: 7,
        pack_date: 9,
        exp_date: 10,
    };

    pub fn get(&self, field: Field) -> u32 {
        match field {
            Field::Name => self.name,
            Field::Variation => self.variation,
            Field::Qty => self.qty,
            Field::Price => self.price,
            Field::Business => self.business,
            Field::PackDate => self.pack_date,
            Field::ExpDate => self.exp_date,
        }
    }

    pub fn set(&mut self, field: Field, px: u32) {
        match field {
            Field::Name => self.name = px,
            Field::Variation => self.variation = px,
            Field::Qty => self.qty = px,
            Field::Price => self.price = px,
            Field::Business => self.business = px,
            Field::PackDate => self.pack_date = px,
            Field::ExpDate => self.exp_date = px,
        }
    }
}

// ============================================================================
// PHYSICAL SIZE
// ============================================================================

/// Physical label size in millimeters, written as `"WxH"` (e.g. `"38x25"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl LabelSize {
    /// Largest accepted side, in millimeters.
    pub const MAX_SIDE_MM: f64 = 300.0;

    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }
}

impl Default for LabelSize {
    fn default() -> Self {
        Self::new(38.0, 25.0)
    }
}

impl fmt::Display for LabelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width_mm, self.height_mm)
    }
}

impl FromStr for LabelSize {
    type Err = PricetagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PricetagError::InvalidInput(format!("label size '{}'", s));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width_mm: f64 = w.trim().parse().map_err(|_| invalid())?;
        let height_mm: f64 = h.trim().parse().map_err(|_| invalid())?;
        let side = 0.0..=Self::MAX_SIDE_MM;
        if width_mm <= 0.0 || height_mm <= 0.0 || !side.contains(&width_mm) || !side.contains(&height_mm) {
            return Err(invalid());
        }
        Ok(Self::new(width_mm, height_mm))
    }
}

impl Serialize for LabelSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Unparseable sizes deserialize to the default rather than failing the
/// whole record.
impl<'de> Deserialize<'de> for LabelSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}

// ============================================================================
// QUANTITY / PRICE
// ============================================================================

/// Quantity unit. Presets store a canonical, language-independent value;
/// anything else is a free-text custom unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QtyUnit {
    Gram,
    Kilogram,
    Piece,
    Liter,
    Milliliter,
    Custom(String),
}

impl QtyUnit {
    pub const PRESETS: [QtyUnit; 5] = [
        QtyUnit::Gram,
        QtyUnit::Kilogram,
        QtyUnit::Piece,
        QtyUnit::Liter,
        QtyUnit::Milliliter,
    ];

    /// Selector value meaning "use the custom text box".
    pub const CUSTOM_SELECTOR: &'static str = "custom";

    /// Generic unit used when the custom text is blank.
    pub const GENERIC: &'static str = "ইউনিট";

    /// Canonical stored value (also what gets printed on the label).
    pub fn value(&self) -> &str {
        match self {
            QtyUnit::Gram => "গ্রাম",
            QtyUnit::Kilogram => "কেজি",
            QtyUnit::Piece => "পিস",
            QtyUnit::Liter => "লিটার",
            QtyUnit::Milliliter => "মিলি",
            QtyUnit::Custom(text) => text,
        }
    }

    /// English menu caption for presets.
    pub fn english_caption(&self) -> &str {
        match self {
            QtyUnit::Gram => "Gram",
            QtyUnit::Kilogram => "Kilogram",
            QtyUnit::Piece => "Piece",
            QtyUnit::Liter => "Liter",
            QtyUnit::Milliliter => "Milliliter",
            QtyUnit::Custom(text) => text,
        }
    }

    /// Map a stored value back to a preset, or keep it as custom text.
    pub fn from_value(value: &str) -> Self {
        Self::PRESETS
            .iter()
            .find(|p| p.value() == value)
            .cloned()
            .unwrap_or_else(|| QtyUnit::Custom(value.to_string()))
    }

    pub fn is_preset(&self) -> bool {
        !matches!(self, QtyUnit::Custom(_))
    }
}

impl Default for QtyUnit {
    fn default() -> Self {
        QtyUnit::Gram
    }
}

impl Serialize for QtyUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.value())
    }
}

impl<'de> Deserialize<'de> for QtyUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_value(&s))
    }
}

/// Whether the shown price includes tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    #[default]
    Inc,
    Exc,
}

impl PriceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceMode::Inc => "inc",
            PriceMode::Exc => "exc",
        }
    }
}

/// Digit system the user typed numbers in. Rendered numbers echo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Numerals {
    #[default]
    English,
    Bengali,
}

impl Numerals {
    /// Rewrite ASCII digits in `text` into this digit system.
    pub fn render(&self, text: &str) -> String {
        match self {
            Numerals::English => text.to_string(),
            Numerals::Bengali => text
                .chars()
                .map(|c| match c.to_digit(10) {
                    Some(d) => char::from_u32('\u{09E6}' as u32 + d).unwrap_or(c),
                    None => c,
                })
                .collect(),
        }
    }
}

// ============================================================================
// BARCODE
// ============================================================================

/// Barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeType {
    #[default]
    Code128,
    Ean13,
    Upc,
}

impl BarcodeType {
    /// Parse a selector value; unknown values fall back to Code128.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ean13" => BarcodeType::Ean13,
            "upc" | "upca" => BarcodeType::Upc,
            _ => BarcodeType::Code128,
        }
    }

    /// Selector value, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeType::Code128 => "code128",
            BarcodeType::Ean13 => "ean13",
            BarcodeType::Upc => "upc",
        }
    }

    /// Symbology name as understood by symbol renderers.
    pub fn format_name(&self) -> &'static str {
        match self {
            BarcodeType::Code128 => "CODE128",
            BarcodeType::Ean13 => "EAN13",
            BarcodeType::Upc => "UPC",
        }
    }
}

/// Barcode settings plus the (possibly empty) explicit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeSpec {
    #[serde(rename = "type", default)]
    pub kind: BarcodeType,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "height", alias = "heightPx", default = "default_barcode_height")]
    pub height_px: u32,
}

pub(crate) fn default_barcode_height() -> u32 {
    15
}

impl Default for BarcodeSpec {
    fn default() -> Self {
        Self {
            kind: BarcodeType::Code128,
            value: String::new(),
            height_px: default_barcode_height(),
        }
    }
}

// ============================================================================
// LABEL DATA
// ============================================================================

/// Most copies one render pass produces.
pub const MAX_LABEL_COUNT: u32 = 500;

/// Canonical label record, built once per render pass by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelData {
    pub name: String,
    pub variation: String,
    pub qty: u32,
    pub qty_unit: QtyUnit,
    pub price: f64,
    /// The price as typed (own digits and decimals kept); empty when there
    /// is no positive price.
    #[serde(default)]
    pub price_display: String,
    pub price_mode: PriceMode,
    pub pack_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
    pub label_count: u32,
    pub label_size: LabelSize,
    pub show: ShowFlags,
    pub fonts: FontSizes,
    #[serde(rename = "bizName")]
    pub business_name: String,
    pub barcode: BarcodeSpec,
    /// Digit system the quantity was typed in.
    pub numerals: Numerals,
    /// Caption language, decided from the fields as typed.
    #[serde(default)]
    pub language: Language,
    /// Whole-label bold emphasis (persisted as `boldTextActive`).
    pub bold_text: bool,
}

impl Default for LabelData {
    fn default() -> Self {
        Self {
            name: String::new(),
            variation: String::new(),
            qty: 1,
            qty_unit: QtyUnit::default(),
            price: 0.0,
            price_display: String::new(),
            price_mode: PriceMode::Inc,
            pack_date: None,
            exp_date: None,
            label_count: 1,
            label_size: LabelSize::default(),
            show: ShowFlags::default(),
            fonts: FontSizes::default(),
            business_name: String::new(),
            barcode: BarcodeSpec::default(),
            numerals: Numerals::English,
            language: Language::English,
            bold_text: false,
        }
    }
}

impl LabelData {
    /// Identity used to keep auto-generated barcodes stable.
    pub fn product_key(&self) -> ProductKey {
        ProductKey::from_parts(&self.name, &self.variation)
    }

    /// Quantity in the user's digit system.
    pub fn qty_text(&self) -> String {
        self.numerals.render(&self.qty.to_string())
    }

    /// Price as printed: the typed text, or the bare number (no trailing
    /// zeros) for records that were not built from a form.
    pub fn price_text(&self) -> String {
        if self.price_display.is_empty() {
            self.price.to_string()
        } else {
            self.price_display.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_size_parse_and_display() {
        let size: LabelSize = "38x25".parse().unwrap();
        assert_eq!(size, LabelSize::new(38.0, 25.0));
        assert_eq!(size.to_string(), "38x25");

        let size: LabelSize = "50.5 X 30".parse().unwrap();
        assert_eq!(size, LabelSize::new(50.5, 30.0));
    }

    #[test]
    fn test_label_size_rejects_garbage() {
        assert!("38".parse::<LabelSize>().is_err());
        assert!("axb".parse::<LabelSize>().is_err());
        assert!("0x25".parse::<LabelSize>().is_err());
        assert!("NaNx25".parse::<LabelSize>().is_err());
    }

    #[test]
    fn test_label_size_rejects_oversized() {
        assert!("300x300".parse::<LabelSize>().is_ok());
        assert!("301x25".parse::<LabelSize>().is_err());
        assert!("38x100000".parse::<LabelSize>().is_err());
        assert!("1e308x1e308".parse::<LabelSize>().is_err());
    }

    #[test]
    fn test_label_size_deserialize_falls_back() {
        let size: LabelSize = serde_json::from_str("\"nonsense\"").unwrap();
        assert_eq!(size, LabelSize::default());
    }

    #[test]
    fn test_qty_unit_round_trip_through_value() {
        assert_eq!(QtyUnit::from_value("কেজি"), QtyUnit::Kilogram);
        assert_eq!(
            QtyUnit::from_value("box"),
            QtyUnit::Custom("box".to_string())
        );
        assert!(QtyUnit::Piece.is_preset());
        assert!(!QtyUnit::Custom("box".into()).is_preset());
    }

    #[test]
    fn test_bengali_numerals_render() {
        assert_eq!(Numerals::Bengali.render("120.5"), "১২০.৫");
        assert_eq!(Numerals::English.render("120.5"), "120.5");
    }

    #[test]
    fn test_show_flags_accept_both_key_styles() {
        let flags: ShowFlags = serde_json::from_str(r#"{"biz": false, "expDate": false}"#).unwrap();
        assert!(!flags.business);
        assert!(!flags.exp_date);
        assert!(flags.name);
    }

    #[test]
    fn test_show_flags_accept_checkbox_text() {
        let flags: ShowFlags = serde_json::from_str(
            r#"{"name": "false", "variation": "off", "qty": 0, "price": "on", "biz": null, "exp": "maybe"}"#,
        )
        .unwrap();
        assert!(!flags.name);
        assert!(!flags.variation);
        assert!(!flags.qty);
        assert!(flags.price);
        assert!(flags.business);
        assert!(flags.exp_date);
        assert!(flags.pack_date);
    }

    #[test]
    fn test_barcode_type_lenient() {
        assert_eq!(BarcodeType::parse_lenient("EAN13"), BarcodeType::Ean13);
        assert_eq!(BarcodeType::parse_lenient("upc"), BarcodeType::Upc);
        assert_eq!(BarcodeType::parse_lenient("qr"), BarcodeType::Code128);
    }

    #[test]
    fn test_price_text_drops_trailing_zeros() {
        let data = LabelData {
            price: 120.0,
            ..Default::default()
        };
        assert_eq!(data.price_text(), "120");
    }

    #[test]
    fn test_price_text_prefers_typed_text() {
        let data = LabelData {
            price: 12.5,
            price_display: "12.50".into(),
            numerals: Numerals::Bengali,
            ..Default::default()
        };
        assert_eq!(data.price_text(), "12.50");
    }
}

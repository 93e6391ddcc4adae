//! # Form Normalizer
//!
//! Turns raw form input into a canonical [`LabelData`].
//!
//! Nothing in here fails. Malformed numbers fall back to safe defaults,
//! unparseable dates fall back to the last good value the form remembered,
//! and unknown selector values map to the first sensible option. Whatever
//! comes out is shown to a human before it is printed, so leniency wins over
//! strict validation.
//!
//! ```
//! use pricetag::normalize::{RawForm, normalize};
//!
//! let form: RawForm = serde_json::from_str(r#"{
//!     "name": "  Soap ",
//!     "qty": "-3",
//!     "price": "abc",
//!     "labelSize": "38x25"
//! }"#).unwrap();
//!
//! let data = normalize(&form);
//! assert_eq!(data.name, "Soap");
//! assert_eq!(data.qty, 1);
//! assert_eq!(data.price, 0.0);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::label::{
    BarcodeSpec, BarcodeType, Field, FontSizes, LabelData, LabelSize, MAX_LABEL_COUNT, Numerals,
    PriceMode, QtyUnit, ShowFlags, default_barcode_height, flag_default_off,
};
use crate::locale::{NumeralSystem, detect_language, detect_numerals, is_bengali_digit};

/// Largest accepted font size, in pixels.
pub const MAX_FONT_PX: u32 = 200;

/// Largest accepted barcode height, in pixels.
pub const MAX_BARCODE_HEIGHT_PX: u32 = 400;

// ============================================================================
// RAW INPUT
// ============================================================================

/// Accepts either a JSON string or a JSON number and keeps it as text.
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextValue {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    let opt: Option<TextValue> = Option::deserialize(deserializer)?;
    Ok(match opt {
        None => String::new(),
        Some(TextValue::Text(s)) => s,
        Some(TextValue::Number(n)) => n.to_string(),
        Some(TextValue::Flag(b)) => b.to_string(),
    })
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = deserialize_text(deserializer)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}

/// A date input as the form holds it: whatever is in the box, plus the last
/// ISO value the box successfully held.
///
/// Deserializes from a bare string (`"01/01/2025"`) or from
/// `{"value": "...", "iso": "2025-01-01"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawDate {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
}

impl RawDate {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            iso: None,
        }
    }

    pub fn with_cached_iso(mut self, iso: impl Into<String>) -> Self {
        self.iso = Some(iso.into());
        self
    }
}

impl<'de> Deserialize<'de> for RawDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DateValue {
            Text(String),
            Full {
                #[serde(default)]
                value: String,
                #[serde(default)]
                iso: Option<String>,
            },
        }

        let opt: Option<DateValue> = Option::deserialize(deserializer)?;
        Ok(match opt {
            None => RawDate::default(),
            Some(DateValue::Text(value)) => RawDate { value, iso: None },
            Some(DateValue::Full { value, iso }) => RawDate { value, iso },
        })
    }
}

/// Raw font-size inputs; missing or garbage entries take the field default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFonts {
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub variation: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub qty: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub price: Option<String>,
    #[serde(rename = "biz", alias = "business", deserialize_with = "deserialize_opt_text")]
    pub business: Option<String>,
    #[serde(rename = "pack", alias = "packDate", deserialize_with = "deserialize_opt_text")]
    pub pack_date: Option<String>,
    #[serde(rename = "exp", alias = "expDate", deserialize_with = "deserialize_opt_text")]
    pub exp_date: Option<String>,
}

impl RawFonts {
    fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Variation => self.variation.as_deref(),
            Field::Qty => self.qty.as_deref(),
            Field::Price => self.price.as_deref(),
            Field::Business => self.business.as_deref(),
            Field::PackDate => self.pack_date.as_deref(),
            Field::ExpDate => self.exp_date.as_deref(),
        }
    }

    /// Raw inputs mirroring already-typed sizes.
    pub fn from_sizes(sizes: &FontSizes) -> Self {
        let text = |f: Field| Some(sizes.get(f).to_string());
        Self {
            name: text(Field::Name),
            variation: text(Field::Variation),
            qty: text(Field::Qty),
            price: text(Field::Price),
            business: text(Field::Business),
            pack_date: text(Field::PackDate),
            exp_date: text(Field::ExpDate),
        }
    }
}

/// Everything the entry form can hold, as the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawForm {
    #[serde(deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub variation: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub qty: String,
    /// Unit selector value: a preset's canonical value or `"custom"`.
    #[serde(deserialize_with = "deserialize_text")]
    pub qty_unit: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub qty_unit_custom: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub price: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub price_mode: String,
    pub pack_date: RawDate,
    pub exp_date: RawDate,
    #[serde(deserialize_with = "deserialize_text")]
    pub label_count: String,
    pub show: ShowFlags,
    pub fonts: RawFonts,
    #[serde(deserialize_with = "deserialize_text")]
    pub biz_name: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub label_size: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub barcode_type: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub barcode_value: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub barcode_height: String,
    #[serde(deserialize_with = "flag_default_off")]
    pub bold_text: bool,
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Build the canonical record from raw form input.
pub fn normalize(form: &RawForm) -> LabelData {
    let numerals = match detect_numerals(&form.qty) {
        NumeralSystem::Bengali => Numerals::Bengali,
        _ => Numerals::English,
    };
    let language = detect_language(&[
        form.name.as_str(),
        form.variation.as_str(),
        form.qty.as_str(),
        form.price.as_str(),
    ]);

    let mut fonts = FontSizes::default();
    for field in Field::ALL {
        if let Some(px) = form.fonts.get(field).and_then(parse_positive) {
            fonts.set(field, px.min(MAX_FONT_PX));
        }
    }
    let barcode_height = parse_positive(&form.barcode_height)
        .map(|px| px.min(MAX_BARCODE_HEIGHT_PX))
        .unwrap_or_else(default_barcode_height);

    LabelData {
        name: form.name.trim().to_string(),
        variation: form.variation.trim().to_string(),
        qty: parse_count(&form.qty),
        qty_unit: normalize_unit(&form.qty_unit, &form.qty_unit_custom),
        price: parse_price(&form.price),
        price_display: price_display(&form.price),
        price_mode: match form.price_mode.trim() {
            "exc" => PriceMode::Exc,
            _ => PriceMode::Inc,
        },
        pack_date: normalize_date_input(&form.pack_date),
        exp_date: normalize_date_input(&form.exp_date),
        label_count: parse_count(&form.label_count).min(MAX_LABEL_COUNT),
        label_size: form.label_size.parse().unwrap_or_default(),
        show: form.show,
        fonts,
        business_name: form.biz_name.trim().to_string(),
        barcode: BarcodeSpec {
            kind: BarcodeType::parse_lenient(&form.barcode_type),
            value: form.barcode_value.trim().to_string(),
            height_px: barcode_height,
        },
        numerals,
        language,
        bold_text: form.bold_text,
    }
}

/// Parse a label size, falling back to the default on malformed input.
pub fn parse_label_size(text: &str) -> LabelSize {
    text.parse().unwrap_or_default()
}

fn normalize_unit(selector: &str, custom: &str) -> QtyUnit {
    match selector.trim() {
        QtyUnit::CUSTOM_SELECTOR => {
            let text = custom.trim();
            QtyUnit::from_value(if text.is_empty() { QtyUnit::GENERIC } else { text })
        }
        "" => QtyUnit::default(),
        other => QtyUnit::from_value(other),
    }
}

/// Rewrite Bengali digits (০-৯) as ASCII digits.
pub fn to_ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{09E6}'..='\u{09EF}' => {
                char::from_digit(c as u32 - '\u{09E6}' as u32, 10).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Leading signed integer, `parseInt` style: `"12abc"` → 12, `"abc"` → none.
fn leading_integer(text: &str) -> Option<i64> {
    let s = text.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let n: i64 = digits[..end].parse().ok()?;
    Some(if negative { -n } else { n })
}

fn parse_positive(text: &str) -> Option<u32> {
    match leading_integer(&to_ascii_digits(text)) {
        Some(n) if n >= 1 => Some(u32::try_from(n).unwrap_or(u32::MAX)),
        _ => None,
    }
}

/// Parse a count (quantity, label copies): anything non-positive or
/// non-numeric becomes 1.
pub fn parse_count(text: &str) -> u32 {
    parse_positive(text).unwrap_or(1)
}

/// Parse a price: leading decimal number, negative or garbage becomes 0.
pub fn parse_price(text: &str) -> f64 {
    let ascii = to_ascii_digits(text);
    let s = ascii.trim();
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// The price as it will be printed: the leading number of the typed text,
/// in the user's own digits, or empty when there is no positive price.
///
/// `"12.50"` stays `"12.50"`, `"৮০ টাকা"` becomes `"৮০"`.
pub fn price_display(text: &str) -> String {
    let s = text.trim();
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !(c.is_ascii_digit() || is_bengali_digit(c))
            }
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    let number = s[..end].trim_end_matches('.');
    if parse_price(number) > 0.0 {
        number.to_string()
    } else {
        String::new()
    }
}

// ============================================================================
// DATES
// ============================================================================

/// Display form of a date: `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Canonical storage form of a date: `yyyy-mm-dd`.
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// `d/m/yyyy` with one- or two-digit day and month and a four-digit year.
fn parse_display(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('/');
    let (d, m, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    };
    if !(digits(d, 1, 2) && digits(m, 1, 2) && digits(y, 4, 4)) {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// Parse a date typed either natively (ISO) or as `dd/mm/yyyy`.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let ascii = to_ascii_digits(text);
    parse_iso(&ascii).or_else(|| parse_display(&ascii))
}

/// Parse a date input; empty means no date, unparseable text falls back to
/// the cached ISO value.
pub fn normalize_date_input(input: &RawDate) -> Option<NaiveDate> {
    if input.value.trim().is_empty() {
        return None;
    }
    normalize_date(&input.value).or_else(|| input.iso.as_deref().and_then(parse_iso))
}

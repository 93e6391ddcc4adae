//! # Locale & Caption Resolution
//!
//! Picks the caption language from what the user actually typed: any Bengali
//! letter or digit in the product fields switches captions to Bengali,
//! otherwise they stay English. Detection is recomputed on every render so
//! captions follow the user as they type.
//!
//! ```
//! use pricetag::locale::{Language, detect_language};
//!
//! assert_eq!(detect_language(&["Soap", "", "1", "80"]), Language::English);
//! assert_eq!(detect_language(&["সাবান", "", "1", "80"]), Language::Bengali);
//! assert_eq!(Language::Bengali.captions().qty, "পরিমাণ");
//! ```

use serde::{Deserialize, Serialize};

use crate::label::QtyUnit;

/// Caption language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Bengali,
}

/// Field captions for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Captions {
    pub qty: &'static str,
    pub price: &'static str,
    pub packaging: &'static str,
    pub expiry: &'static str,
    pub business: &'static str,
}

impl Captions {
    pub const ENGLISH: Captions = Captions {
        qty: "Qty",
        price: "Price",
        packaging: "Pckg",
        expiry: "EXP",
        business: "Business",
    };

    pub const BENGALI: Captions = Captions {
        qty: "পরিমাণ",
        price: "দাম",
        packaging: "প্যাকিং",
        expiry: "মেয়াদ",
        business: "ব্যবসা",
    };
}

impl Language {
    pub fn captions(&self) -> Captions {
        match self {
            Language::English => Captions::ENGLISH,
            Language::Bengali => Captions::BENGALI,
        }
    }
}

/// Bengali consonants and independent vowels (অ..হ).
fn is_bengali_letter(c: char) -> bool {
    ('\u{0985}'..='\u{09B9}').contains(&c)
}

/// Bengali digits (০..৯).
pub fn is_bengali_digit(c: char) -> bool {
    ('\u{09E6}'..='\u{09EF}').contains(&c)
}

/// Decide the caption language from the inspected field values
/// (name, variation, qty, price).
pub fn detect_language(fields: &[&str]) -> Language {
    let bengali = fields
        .iter()
        .flat_map(|f| f.chars())
        .any(|c| is_bengali_letter(c) || is_bengali_digit(c));
    if bengali {
        Language::Bengali
    } else {
        Language::English
    }
}

// ============================================================================
// UNIT MENU
// ============================================================================

/// Digit system found in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumeralSystem {
    Bengali,
    English,
    /// Neither digit system present.
    Mixed,
}

/// Bengali wins if any Bengali digit is present, then ASCII digits.
pub fn detect_numerals(text: &str) -> NumeralSystem {
    if text.chars().any(is_bengali_digit) {
        NumeralSystem::Bengali
    } else if text.chars().any(|c| c.is_ascii_digit()) {
        NumeralSystem::English
    } else {
        NumeralSystem::Mixed
    }
}

/// One selectable unit: canonical value plus a caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOption {
    pub value: String,
    pub caption: String,
}

/// The quantity-unit menu for the current quantity text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitMenu {
    pub options: Vec<UnitOption>,
    /// The previous selection, if it is still offered.
    pub selected: Option<String>,
}

impl UnitMenu {
    /// Rebuild the unit menu. Captions follow the digits used in `qty`;
    /// option values never change, so `current` survives the rebuild.
    pub fn for_quantity(qty: &str, current: &str) -> Self {
        let bengali = detect_numerals(qty) == NumeralSystem::Bengali;

        let mut options: Vec<UnitOption> = QtyUnit::PRESETS
            .iter()
            .map(|unit| UnitOption {
                value: unit.value().to_string(),
                caption: if bengali {
                    unit.value().to_string()
                } else {
                    unit.english_caption().to_string()
                },
            })
            .collect();
        options.push(UnitOption {
            value: QtyUnit::CUSTOM_SELECTOR.to_string(),
            caption: "Custom…".to_string(),
        });

        let selected = options
            .iter()
            .find(|o| o.value == current)
            .map(|o| o.value.clone());

        Self { options, selected }
    }
}

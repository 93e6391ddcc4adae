//! Persisted settings with explicit merge-patch updates.
//!
//! Settings are stored as one JSON object. Every write goes through a
//! [`SettingsPatch`] that only touches its own keys, so saving the barcode
//! section never clobbers display toggles and vice versa.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{KeyValueStore, KeyValueStoreExt, SharedStore, decode_lenient, keys, merge_patch};
use crate::error::{PricetagError, Result};
use crate::label::{BarcodeType, FontSizes, LabelData, LabelSize, PriceMode, QtyUnit, ShowFlags};
use crate::normalize::{RawFonts, RawForm};

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 2;

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Persisted barcode defaults (the value itself is per product).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeSettings {
    #[serde(rename = "type")]
    pub kind: BarcodeType,
    pub height: u32,
}

impl Default for BarcodeSettings {
    fn default() -> Self {
        Self {
            kind: BarcodeType::Code128,
            height: 15,
        }
    }
}

/// Versioned settings schema. Every key is optional on disk; anything
/// missing is filled from the defaults on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub version: u32,
    pub price_mode: PriceMode,
    pub label_size: LabelSize,
    pub barcode: BarcodeSettings,
    pub show: ShowFlags,
    pub fonts: FontSizes,
    pub biz_name: String,
    pub bold_text_active: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            price_mode: PriceMode::Inc,
            label_size: LabelSize::default(),
            barcode: BarcodeSettings::default(),
            show: ShowFlags::default(),
            fonts: FontSizes::default(),
            biz_name: String::new(),
            bold_text_active: false,
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    /// A form pre-filled from these settings, with empty product fields.
    pub fn seed_form(&self) -> RawForm {
        RawForm {
            qty: "1".into(),
            qty_unit: QtyUnit::default().value().to_string(),
            label_count: "1".into(),
            price_mode: self.price_mode.as_str().into(),
            show: self.show,
            fonts: RawFonts::from_sizes(&self.fonts),
            biz_name: self.biz_name.clone(),
            label_size: self.label_size.to_string(),
            barcode_type: self.barcode.kind.as_str().into(),
            barcode_height: self.barcode.height.to_string(),
            bold_text: self.bold_text_active,
            ..Default::default()
        }
    }
}

// ============================================================================
// PATCHES
// ============================================================================

/// A merge patch against the settings object.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsPatch(Value);

impl SettingsPatch {
    /// Wrap an arbitrary JSON merge patch.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Display section: visibility toggles, font sizes, business name.
    pub fn display(show: &ShowFlags, fonts: &FontSizes, biz_name: &str) -> Self {
        Self(json!({ "show": show, "fonts": fonts, "bizName": biz_name }))
    }

    /// Display section back to defaults. The business name is kept.
    pub fn reset_display() -> Self {
        Self(json!({ "show": ShowFlags::default(), "fonts": FontSizes::default() }))
    }

    /// Barcode section: label size plus barcode type and height.
    pub fn barcode(label_size: LabelSize, kind: BarcodeType, height: u32) -> Self {
        Self(json!({
            "labelSize": label_size,
            "barcode": { "type": kind, "height": height },
        }))
    }

    /// Barcode section back to defaults.
    pub fn reset_barcode() -> Self {
        let defaults = BarcodeSettings::default();
        Self::barcode(LabelSize::default(), defaults.kind, defaults.height)
    }

    /// What a live form edit persists: price mode, label size, barcode
    /// type and height.
    pub fn form_changed(data: &LabelData) -> Self {
        Self(json!({
            "priceMode": data.price_mode,
            "labelSize": data.label_size,
            "barcode": { "type": data.barcode.kind, "height": data.barcode.height_px },
        }))
    }

    pub fn bold_text(active: bool) -> Self {
        Self(json!({ "boldTextActive": active }))
    }

    pub fn theme(theme: Theme) -> Self {
        Self(json!({ "theme": theme }))
    }

    /// Preset matching the Rongta 38x25 sample sticker.
    pub fn rongta_3825_sample() -> Self {
        Self(json!({
            "labelSize": LabelSize::new(38.0, 25.0),
            "fonts": FontSizes::RONGTA_3825_SAMPLE,
            "barcode": { "height": 23 },
        }))
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Settings service over a key-value store.
#[derive(Clone)]
pub struct SettingsStore {
    store: SharedStore,
}

impl SettingsStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The stored settings object exactly as persisted.
    pub fn raw(&self) -> Value {
        self.store.get_json(keys::SETTINGS, Value::Object(Default::default()))
    }

    /// Load settings, default-filling anything missing or unreadable. One
    /// bad field never costs the others.
    pub fn load(&self) -> Settings {
        let mut settings = decode_lenient::<Settings>(&self.raw()).unwrap_or_else(|| {
            tracing::warn!("unreadable settings, using defaults");
            Settings::default()
        });
        settings.version = SETTINGS_VERSION;
        settings
    }

    /// Merge `patch` into the stored object and return the result.
    pub fn patch(&self, patch: &SettingsPatch) -> Result<Settings> {
        let mut current = self.raw();
        merge_patch(&mut current, patch.as_value());
        merge_patch(&mut current, &json!({ "version": SETTINGS_VERSION }));
        tracing::debug!(patch = %patch.as_value(), "settings patched");
        self.store.set_json(keys::SETTINGS, &current)?;
        Ok(self.load())
    }

    /// Forget all stored settings.
    pub fn reset(&self) -> Result<Settings> {
        self.store.remove(keys::SETTINGS)?;
        Ok(Settings::default())
    }

    /// Flip whole-label bold emphasis and return the new state.
    pub fn toggle_bold_text(&self) -> Result<bool> {
        let active = !self.load().bold_text_active;
        self.patch(&SettingsPatch::bold_text(active))?;
        Ok(active)
    }

    /// Flip the UI theme and return the new one.
    pub fn toggle_theme(&self) -> Result<Theme> {
        let next = match self.load().theme {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
        self.patch(&SettingsPatch::theme(next))?;
        Ok(next)
    }

    /// Build a form from settings, overlaid with whatever the caller sent.
    ///
    /// `overrides` is a (possibly partial) form in its JSON shape; keys it
    /// does not mention keep their settings-derived values.
    pub fn form_with(&self, overrides: &Value) -> Result<RawForm> {
        if !(overrides.is_object() || overrides.is_null()) {
            return Err(PricetagError::InvalidInput(
                "form must be a JSON object".to_string(),
            ));
        }
        let mut form = serde_json::to_value(self.load().seed_form())?;
        if overrides.is_object() {
            merge_patch(&mut form, overrides);
        }
        Ok(serde_json::from_value(form)?)
    }
}

//! Saved products.
//!
//! A product is a snapshot of the per-product half of the form (name,
//! variation, quantity, price, dates, barcode). Products are only created by
//! an explicit save and only removed by an explicit delete.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{KeyValueStore, KeyValueStoreExt, SharedStore, decode_lenient, keys};
use crate::error::Result;
use crate::label::{LabelData, Numerals, QtyUnit};
use crate::normalize::{RawDate, RawForm, format_iso, normalize_date, parse_count, parse_price};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) if n >= 1.0 => n.min(u32::MAX as f64) as u32,
        Some(NumberOrText::Text(s)) => parse_count(&s),
        _ => 1,
    })
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) if n.is_finite() && n >= 0.0 => n,
        Some(NumberOrText::Text(s)) => parse_price(&s),
        _ => 0.0,
    })
}

/// Dates were historically stored as `""` when unset.
fn lenient_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error> {
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text.as_deref().and_then(normalize_date))
}

fn default_qty() -> u32 {
    1
}

/// A saved product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variation: String,
    #[serde(default = "default_qty", deserialize_with = "lenient_count")]
    pub qty: u32,
    /// Missing in products saved before units existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty_unit: Option<QtyUnit>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Price as typed, digits and decimals kept. Empty in older saves.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub price_text: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub pack_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub exp_date: Option<NaiveDate>,
    /// Explicit barcode value at save time (may be empty).
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub numerals: Numerals,
    /// Unix milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

impl Product {
    /// Snapshot the per-product fields of a label.
    pub fn from_label(data: &LabelData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: data.name.clone(),
            variation: data.variation.clone(),
            qty: data.qty,
            qty_unit: Some(data.qty_unit.clone()),
            price: data.price,
            price_text: data.price_display.clone(),
            pack_date: data.pack_date,
            exp_date: data.exp_date,
            barcode: data.barcode.value.clone(),
            numerals: data.numerals,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Load this product back into a form. Dates the product does not have
    /// leave the form's dates untouched.
    pub fn apply_to(&self, form: &mut RawForm) {
        form.name = self.name.clone();
        form.variation = self.variation.clone();
        form.price = if self.price_text.is_empty() {
            self.numerals.render(&self.price.to_string())
        } else {
            self.price_text.clone()
        };
        form.qty = self.numerals.render(&self.qty.to_string());

        match &self.qty_unit {
            Some(unit) if unit.is_preset() => {
                form.qty_unit = unit.value().to_string();
                form.qty_unit_custom.clear();
            }
            Some(unit) => {
                form.qty_unit = QtyUnit::CUSTOM_SELECTOR.to_string();
                form.qty_unit_custom = unit.value().to_string();
            }
            None => {}
        }

        if let Some(date) = self.pack_date {
            let iso = format_iso(date);
            form.pack_date = RawDate::text(iso.clone()).with_cached_iso(iso);
        }
        if let Some(date) = self.exp_date {
            let iso = format_iso(date);
            form.exp_date = RawDate::text(iso.clone()).with_cached_iso(iso);
        }
        form.barcode_value = self.barcode.clone();
    }

    fn matches(&self, term: &str) -> bool {
        format!("{} {}", self.name, self.variation)
            .to_lowercase()
            .contains(term)
    }
}

/// Saved-products service over a key-value store.
#[derive(Clone)]
pub struct ProductStore {
    store: SharedStore,
}

impl ProductStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stored entries as they are, readable or not.
    fn entries(&self) -> Vec<Value> {
        self.store.get_json(keys::PRODUCTS, Vec::new())
    }

    /// Every readable saved product, in storage order. Fields that no longer
    /// decode take their defaults; entries without an id are skipped.
    pub fn all(&self) -> Vec<Product> {
        self.entries()
            .iter()
            .filter_map(|v| {
                let product = decode_lenient::<Product>(v);
                if product.is_none() {
                    tracing::warn!("skipping unreadable saved product");
                }
                product
            })
            .collect()
    }

    /// Products whose `"name variation"` contains `search` (case-insensitive),
    /// newest first.
    pub fn list(&self, search: &str) -> Vec<Product> {
        let term = search.trim().to_lowercase();
        let mut products: Vec<Product> = self
            .all()
            .into_iter()
            .filter(|p| p.matches(&term))
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.all().into_iter().find(|p| p.id == id)
    }

    /// Save a snapshot of `data`; it becomes the last used product.
    ///
    /// Existing entries are written back untouched, even ones that do not
    /// decode.
    pub fn save(&self, data: &LabelData) -> Result<Product> {
        let product = Product::from_label(data);
        let mut entries = self.entries();
        entries.push(serde_json::to_value(&product)?);
        self.store.set_json(keys::PRODUCTS, &entries)?;
        self.set_last_used(&product.id)?;
        tracing::info!(id = %product.id, name = %product.name, "product saved");
        Ok(product)
    }

    /// Delete one product. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|v| v.get("id").and_then(Value::as_str) != Some(id));
        if entries.len() == before {
            return Ok(false);
        }
        self.store.set_json(keys::PRODUCTS, &entries)?;
        Ok(true)
    }

    /// Delete every saved product.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(keys::PRODUCTS)
    }

    pub fn set_last_used(&self, id: &str) -> Result<()> {
        self.store.set_json(keys::LAST_PRODUCT_ID, id)
    }

    /// The last used product, if it still exists.
    pub fn last_used(&self) -> Option<Product> {
        let id: Option<String> = self.store.get_json(keys::LAST_PRODUCT_ID, None);
        id.and_then(|id| self.get(&id))
    }

    /// Apply a saved product to `form` and remember it as last used.
    pub fn use_product(&self, id: &str, form: &mut RawForm) -> Result<Option<Product>> {
        let Some(product) = self.get(id) else {
            return Ok(None);
        };
        product.apply_to(form);
        self.set_last_used(&product.id)?;
        Ok(Some(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn products() -> (Arc<MemoryStore>, ProductStore) {
        let mem = Arc::new(MemoryStore::new());
        (mem.clone(), ProductStore::new(mem))
    }

    fn label(name: &str, variation: &str) -> LabelData {
        LabelData {
            name: name.into(),
            variation: variation.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_list_newest_first() {
        let (_, store) = products();
        let mut older = store.save(&label("Soap", "Lavender")).unwrap();
        let mut newer = store.save(&label("Rice", "Miniket")).unwrap();
        older.created_at = 1_000;
        newer.created_at = 2_000;
        store
            .store
            .set_json(keys::PRODUCTS, &vec![older.clone(), newer.clone()])
            .unwrap();

        let listed = store.list("");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
        assert_eq!(store.last_used().map(|p| p.id), Some(newer.id));
    }

    #[test]
    fn test_search_is_case_insensitive_over_name_and_variation() {
        let (_, store) = products();
        store.save(&label("Soap", "Lavender")).unwrap();
        store.save(&label("Rice", "Miniket")).unwrap();

        assert_eq!(store.list("LAVEN").len(), 1);
        assert_eq!(store.list("soap lav").len(), 1);
        assert_eq!(store.list("nothing").len(), 0);
    }

    #[test]
    fn test_delete_and_clear() {
        let (_, store) = products();
        let a = store.save(&label("Soap", "")).unwrap();
        store.save(&label("Rice", "")).unwrap();

        assert!(store.delete(&a.id).unwrap());
        assert!(!store.delete(&a.id).unwrap());
        assert_eq!(store.all().len(), 1);

        store.clear().unwrap();
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_legacy_products_load() {
        let (mem, store) = products();
        mem.set_raw(
            keys::PRODUCTS,
            r#"[
                {"id": "a", "name": "Soap", "qty": "2", "price": "80", "packDate": "", "expDate": "2025-01-01", "barcode": ""},
                {"id": "b", "name": "Oil", "qty": 5, "price": 120.5, "qtyUnit": "লিটার", "createdAt": 7},
                {"name": "missing id"}
            ]"#,
        )
        .unwrap();

        let all = store.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].qty, 2);
        assert_eq!(all[0].price, 80.0);
        assert_eq!(all[0].pack_date, None);
        assert_eq!(all[0].exp_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(all[0].qty_unit, None);
        assert_eq!(all[1].qty_unit, Some(QtyUnit::Liter));
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let (mem, store) = products();
        mem.set_raw(
            keys::PRODUCTS,
            r#"[{"id": "a", "name": "Soap", "variation": null, "barcode": null, "qty": 3}]"#,
        )
        .unwrap();

        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Soap");
        assert_eq!(all[0].variation, "");
        assert_eq!(all[0].barcode, "");
        assert_eq!(all[0].qty, 3);
    }

    #[test]
    fn test_save_and_delete_keep_unreadable_entries() {
        let (mem, store) = products();
        mem.set_raw(
            keys::PRODUCTS,
            r#"[{"id": "old", "name": "Soap", "variation": null}, {"name": "no id"}, 42]"#,
        )
        .unwrap();

        let saved = store.save(&label("Rice", "")).unwrap();
        let stored: Vec<Value> = mem.get_json(keys::PRODUCTS, Vec::new());
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[0]["variation"], Value::Null);
        assert_eq!(stored[1]["name"], "no id");
        assert_eq!(stored[2], 42);
        assert_eq!(stored[3]["id"], saved.id.as_str());

        assert!(store.delete("old").unwrap());
        let stored: Vec<Value> = mem.get_json(keys::PRODUCTS, Vec::new());
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0]["name"], "no id");
        assert_eq!(stored[1], 42);

        assert!(!store.delete("old").unwrap());
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_typed_price_round_trips() {
        let (_, store) = products();
        let data = normalize(&RawForm {
            name: "Tea".into(),
            qty: "৫".into(),
            price: "12.50".into(),
            ..Default::default()
        });
        let saved = store.save(&data).unwrap();

        let mut form = RawForm::default();
        store.use_product(&saved.id, &mut form).unwrap();
        assert_eq!(form.price, "12.50");
        assert_eq!(form.qty, "৫");
    }

    #[test]
    fn test_apply_to_restores_units_and_keeps_missing_dates() {
        let (_, store) = products();
        let mut data = label("Soap", "Lavender");
        data.qty_unit = QtyUnit::Custom("box".into());
        data.exp_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        data.barcode.value = "12345".into();
        let saved = store.save(&data).unwrap();

        let mut form = RawForm {
            pack_date: RawDate::text("02/02/2024"),
            ..Default::default()
        };
        let used = store.use_product(&saved.id, &mut form).unwrap();
        assert!(used.is_some());
        assert_eq!(form.qty_unit, "custom");
        assert_eq!(form.qty_unit_custom, "box");
        assert_eq!(form.pack_date.value, "02/02/2024");
        assert_eq!(form.exp_date.value, "2025-01-01");
        assert_eq!(form.barcode_value, "12345");

        let round = normalize(&form);
        assert_eq!(round.name, "Soap");
        assert_eq!(round.exp_date, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn test_use_unknown_product() {
        let (_, store) = products();
        let mut form = RawForm::default();
        assert_eq!(store.use_product("nope", &mut form).unwrap(), None);
        assert_eq!(form, RawForm::default());
    }
}

//! # Persistence
//!
//! A tiny key-value contract for JSON blobs, and the typed stores built on
//! top of it.
//!
//! ## Contract
//!
//! - `get` never fails: missing or corrupt data resolves to the caller's
//!   fallback (and is logged).
//! - `set` replaces the whole value for a key.
//! - `remove` is idempotent.
//!
//! | Key | Contents |
//! |-----|----------|
//! | `lg_products` | saved products (array) |
//! | `lg_settings` | settings object |
//! | `lg_last_product_id` | id of the last used product |
//! | `lg_auto_barcodes` | product key → auto barcode |
//! | `lg_barcode_sequence` | next sequential barcode |

mod products;
mod settings;

pub use products::{Product, ProductStore};
pub use settings::{Settings, SettingsPatch, SettingsStore, Theme};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;

/// Storage keys.
pub mod keys {
    pub const PRODUCTS: &str = "lg_products";
    pub const SETTINGS: &str = "lg_settings";
    pub const LAST_PRODUCT_ID: &str = "lg_last_product_id";
    pub const AUTO_BARCODES: &str = "lg_auto_barcodes";
    pub const BARCODE_SEQUENCE: &str = "lg_barcode_sequence";
}

/// Raw string storage keyed by name.
pub trait KeyValueStore: Send + Sync {
    /// Stored text for `key`, if any. Read failures count as missing.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Replace the text stored under `key`.
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON helpers over any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Decode the value under `key`, or return `fallback` if it is missing,
    /// `null`, or does not decode.
    fn get_json<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(raw) = self.get_raw(key) else {
            return fallback;
        };
        match serde_json::from_str::<Option<T>>(&raw) {
            Ok(Some(value)) => value,
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt stored value, using fallback");
                fallback
            }
        }
    }

    /// Encode and store `value` under `key`.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.set_raw(key, &text)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.as_ref().get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.as_ref().set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.as_ref().remove(key)
    }
}

/// Shared store handle used by the engine and the typed stores.
pub type SharedStore = Arc<dyn KeyValueStore>;

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

/// In-memory store, mostly for tests and previews that should not persist.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value");
                None
            }
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// LENIENT DECODING
// ============================================================================

/// Decode a stored record, keeping every field that still reads.
///
/// A strict decode is tried first. When it fails, the record is rebuilt leaf
/// by leaf (nested objects are walked), and a leaf is kept only if the record
/// still decodes with it; dropped leaves take their serde defaults. Leaves
/// that only decode once a required sibling is in place are retried until a
/// pass keeps nothing new. Returns `None` if even that does not decode or
/// `raw` is not an object.
pub fn decode_lenient<T: DeserializeOwned>(raw: &Value) -> Option<T> {
    match serde_json::from_value::<T>(raw.clone()) {
        Ok(value) => return Some(value),
        Err(e) => tracing::debug!(error = %e, "strict decode failed, salvaging fields"),
    }
    if !raw.is_object() {
        return None;
    }

    let mut pending = Vec::new();
    collect_leaves(raw, &mut Vec::new(), &mut pending);

    let mut accepted = Value::Object(Map::new());
    loop {
        let before = pending.len();
        let mut rejected = Vec::new();
        for (path, value) in pending {
            let mut candidate = accepted.clone();
            insert_at(&mut candidate, &path, value.clone());
            if serde_json::from_value::<T>(candidate.clone()).is_ok() {
                accepted = candidate;
            } else {
                rejected.push((path, value));
            }
        }
        pending = rejected;
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    for (path, _) in &pending {
        tracing::warn!(field = %path.join("."), "dropping unreadable stored field");
    }
    serde_json::from_value(accepted).ok()
}

/// Paths to every leaf of `value`. Empty objects count as leaves.
fn collect_leaves(value: &Value, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                path.push(key.clone());
                collect_leaves(child, path, out);
                path.pop();
            }
        }
        leaf => out.push((path.clone(), leaf.clone())),
    }
}

fn insert_at(target: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = target;
    for key in parents {
        node = match node {
            Value::Object(map) => map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

// ============================================================================
// MERGE PATCH
// ============================================================================

/// Apply a JSON merge patch: objects merge key by key (recursively), `null`
/// deletes a key, anything else replaces the target outright.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}

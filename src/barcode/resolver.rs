//! Barcode value resolution strategies.
//!
//! Two strategies share one interface:
//!
//! - [`PerProductResolver`]: every copy of a product carries the same value;
//!   products without an explicit value get an 8-digit auto value that is
//!   remembered per product key and never handed to a different product.
//! - [`SequentialResolver`]: numeric values count up per copy, and a running
//!   counter advances after each print.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{PricetagError, Result};
use crate::store::{KeyValueStoreExt, SharedStore, keys};

/// Auto values are 8 digits.
const AUTO_DIGITS: usize = 8;
const AUTO_MODULUS: u64 = 100_000_000;

/// Normalized `name|variation` identity of a logical product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductKey(String);

impl ProductKey {
    pub fn from_parts(name: &str, variation: &str) -> Self {
        Self(format!(
            "{}|{}",
            name.trim().to_lowercase(),
            variation.trim().to_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which continuation strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarcodeMode {
    #[default]
    PerProduct,
    Sequential,
}

impl fmt::Display for BarcodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarcodeMode::PerProduct => write!(f, "per-product"),
            BarcodeMode::Sequential => write!(f, "sequential"),
        }
    }
}

impl FromStr for BarcodeMode {
    type Err = PricetagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "per-product" | "product" | "stable" => Ok(BarcodeMode::PerProduct),
            "sequential" | "sequence" => Ok(BarcodeMode::Sequential),
            other => Err(PricetagError::InvalidInput(format!(
                "unknown barcode mode '{}' (expected per-product or sequential)",
                other
            ))),
        }
    }
}

/// Resolves the barcode value(s) for one render pass.
pub trait BarcodeValueResolver: Send + Sync {
    fn mode(&self) -> BarcodeMode;

    /// Base value for this pass. Non-empty explicit values are used verbatim.
    fn resolve(&self, key: &ProductKey, explicit: &str) -> Result<String>;

    /// Value printed on copy `copy` (0-based) of a pass with base `base`.
    fn value_for_copy(&self, base: &str, _copy: u32) -> String {
        base.to_string()
    }

    /// Called once a pass of `copies` labels was sent to print.
    fn after_print(&self, _base: &str, _copies: u32) -> Result<()> {
        Ok(())
    }
}

/// Build the resolver for `mode` over `store`.
pub fn resolver_for(mode: BarcodeMode, store: SharedStore) -> Box<dyn BarcodeValueResolver> {
    match mode {
        BarcodeMode::PerProduct => Box::new(PerProductResolver::new(store)),
        BarcodeMode::Sequential => Box::new(SequentialResolver::new(store)),
    }
}

// ============================================================================
// PER PRODUCT
// ============================================================================

type SeedSource = Box<dyn Fn() -> u64 + Send + Sync>;

fn clock_seed() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Stable value per product key, generated once and remembered.
pub struct PerProductResolver {
    store: SharedStore,
    seed: SeedSource,
}

impl PerProductResolver {
    /// Seeds auto values from the current Unix time in milliseconds.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            seed: Box::new(clock_seed),
        }
    }

    /// Replace the seed source (tests, deterministic tooling).
    pub fn with_seed_source(mut self, seed: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.seed = Box::new(seed);
        self
    }

    /// The stored product key → auto value map.
    pub fn auto_map(&self) -> BTreeMap<String, String> {
        self.store.get_json(keys::AUTO_BARCODES, BTreeMap::new())
    }

    /// First free 8-digit value at or after the seed, wrapping at 10^8.
    fn next_unique(seed: u64, taken: &HashSet<&str>) -> String {
        let mut n = seed % AUTO_MODULUS;
        loop {
            let candidate = format!("{:0width$}", n, width = AUTO_DIGITS);
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            n = (n + 1) % AUTO_MODULUS;
        }
    }
}

impl BarcodeValueResolver for PerProductResolver {
    fn mode(&self) -> BarcodeMode {
        BarcodeMode::PerProduct
    }

    fn resolve(&self, key: &ProductKey, explicit: &str) -> Result<String> {
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }

        let mut map = self.auto_map();
        if let Some(existing) = map.get(key.as_str()).filter(|v| !v.is_empty()) {
            return Ok(existing.clone());
        }

        let value = {
            let taken: HashSet<&str> = map.values().map(String::as_str).collect();
            Self::next_unique((self.seed)(), &taken)
        };
        map.insert(key.as_str().to_string(), value.clone());
        self.store.set_json(keys::AUTO_BARCODES, &map)?;
        tracing::debug!(product = %key, value = %value, "generated auto barcode");
        Ok(value)
    }
}

// ============================================================================
// SEQUENTIAL
// ============================================================================

/// Counts up per copy and per print.
pub struct SequentialResolver {
    store: SharedStore,
}

impl SequentialResolver {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Next value the counter will hand out.
    pub fn counter(&self) -> u64 {
        self.store.get_json(keys::BARCODE_SEQUENCE, 1u64)
    }

    fn numeric(value: &str) -> Option<u64> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok()
    }
}

impl BarcodeValueResolver for SequentialResolver {
    fn mode(&self) -> BarcodeMode {
        BarcodeMode::Sequential
    }

    fn resolve(&self, _key: &ProductKey, explicit: &str) -> Result<String> {
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }
        Ok(format!(
            "{:0width$}",
            self.counter() % AUTO_MODULUS,
            width = AUTO_DIGITS
        ))
    }

    /// Numeric bases count up, keeping their zero padding.
    fn value_for_copy(&self, base: &str, copy: u32) -> String {
        match Self::numeric(base).and_then(|n| n.checked_add(u64::from(copy))) {
            Some(n) => format!("{:0width$}", n, width = base.len()),
            None => base.to_string(),
        }
    }

    fn after_print(&self, base: &str, copies: u32) -> Result<()> {
        let Some(next) = Self::numeric(base).and_then(|n| n.checked_add(u64::from(copies))) else {
            return Ok(());
        };
        self.store.set_json(keys::BARCODE_SEQUENCE, &next)?;
        tracing::debug!(next, "advanced barcode sequence");
        Ok(())
    }
}

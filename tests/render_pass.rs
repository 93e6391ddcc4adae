//! # Render Pass Tests
//!
//! End-to-end behavior of the label engine: raw JSON form in, label
//! descriptors out, with state kept in a real store between passes.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use pricetag::barcode::{BarcodeMode, PerProductResolver};
use pricetag::label::{Field, FontSizes, LabelSize};
use pricetag::locale::Language;
use pricetag::normalize::normalize;
use pricetag::render::{LabelEngine, Node};
use pricetag::store::{JsonFileStore, MemoryStore, SettingsPatch, SharedStore};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn memory_engine(mode: BarcodeMode) -> (SharedStore, LabelEngine) {
    let store: SharedStore = Arc::new(MemoryStore::new());
    (store.clone(), LabelEngine::new(store, mode))
}

fn text_sizes(label: &pricetag::render::LabelDescriptor) -> Vec<u32> {
    label
        .nodes
        .iter()
        .flat_map(|n| match n {
            Node::Text { size, .. } => vec![*size],
            Node::DateRow { spans } => spans.iter().map(|s| s.size).collect(),
            _ => vec![],
        })
        .collect()
}

// ============================================================================
// BARCODES
// ============================================================================

#[test]
fn test_copies_share_one_auto_barcode() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({
            "name": "Soap",
            "variation": "Lavender",
            "labelSize": "38x25",
            "labelCount": "3",
            "barcodeValue": "",
        }))
        .unwrap();

    let pass = engine.preview(&form).unwrap();
    assert_eq!(pass.data.product_key().as_str(), "soap|lavender");
    assert_eq!(pass.data.label_size, LabelSize::new(38.0, 25.0));
    assert_eq!(pass.labels.len(), 3);

    let values: Vec<&str> = pass.labels.iter().filter_map(|l| l.barcode()).collect();
    assert_eq!(values, vec![pass.barcode.as_str(); 3]);
    assert_eq!(pass.barcode.len(), 8);
    assert!(pass.barcode.bytes().all(|b| b.is_ascii_digit()));

    let again = engine.preview(&form).unwrap();
    assert_eq!(again.barcode, pass.barcode);
}

#[test]
fn test_auto_barcode_survives_a_new_engine() {
    let dir = tempfile::tempdir().unwrap();
    let form = json!({"name": "Soap", "variation": "Lavender"});

    let first = {
        let store: SharedStore = Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let engine = LabelEngine::new(store, BarcodeMode::PerProduct);
        let form = engine.form_from_json(&form).unwrap();
        engine.preview(&form).unwrap().barcode
    };

    let store: SharedStore = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let engine = LabelEngine::new(store, BarcodeMode::PerProduct);
    let form = engine.form_from_json(&form).unwrap();
    assert_eq!(engine.preview(&form).unwrap().barcode, first);
}

#[test]
fn test_colliding_seeds_give_distinct_values() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let resolver = PerProductResolver::new(store.clone()).with_seed_source(|| 1_700_000_000_123);
    let engine = LabelEngine::with_resolver(store, Box::new(resolver));

    let soap = engine.form_from_json(&json!({"name": "Soap"})).unwrap();
    let rice = engine.form_from_json(&json!({"name": "Rice"})).unwrap();
    let a = engine.preview(&soap).unwrap().barcode;
    let b = engine.preview(&rice).unwrap().barcode;

    assert_eq!(a, "00000123");
    assert_eq!(b, "00000124");
    assert_eq!(engine.preview(&soap).unwrap().barcode, a);
}

#[test]
fn test_explicit_barcode_wins() {
    let (_, engine) = memory_engine(BarcodeMode::Sequential);
    let form = engine
        .form_from_json(&json!({"name": "Soap", "barcodeValue": "SOAP-01"}))
        .unwrap();
    let pass = engine.preview(&form).unwrap();
    assert_eq!(pass.labels[0].barcode(), Some("SOAP-01"));
}

#[test]
fn test_bad_symbol_still_renders_text() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({
            "name": "Soap",
            "barcodeType": "ean13",
            "barcodeValue": "ABC",
        }))
        .unwrap();

    let pass = engine.preview(&form).unwrap();
    let label = &pass.labels[0];
    assert!(label.has_placeholder());
    assert_eq!(label.barcode(), None);
    assert_eq!(label.text(Field::Name), Some("Soap"));
}

// ============================================================================
// VISIBILITY
// ============================================================================

#[test]
fn test_expiry_absent_without_flag_or_date() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({"name": "Soap", "show": {"exp": false}, "expDate": ""}))
        .unwrap();
    let pass = engine.preview(&form).unwrap();
    assert_eq!(pass.labels[0].text(Field::ExpDate), None);
}

#[test]
fn test_entered_expiry_is_shown_despite_flag() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({
            "name": "Soap",
            "show": {"exp": false},
            "expDate": "2025-01-01",
        }))
        .unwrap();
    let pass = engine.preview(&form).unwrap();
    assert_eq!(pass.labels[0].text(Field::ExpDate), Some("EXP: 01/01/2025"));
}

#[test]
fn test_garbage_counts_render_one_label() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    for count in ["0", "-4", "abc", ""] {
        let form = engine
            .form_from_json(&json!({"name": "Soap", "qty": count, "labelCount": count}))
            .unwrap();
        let pass = engine.preview(&form).unwrap();
        assert_eq!(pass.labels.len(), 1, "labelCount {:?}", count);
        assert_eq!(pass.data.qty, 1, "qty {:?}", count);
    }
}

#[test]
fn test_price_prints_as_typed() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({"name": "Tea", "qty": "৫", "price": "12.50"}))
        .unwrap();
    let pass = engine.preview(&form).unwrap();
    let label = &pass.labels[0];
    assert_eq!(label.text(Field::Price), Some("দাম: 12.50৳"));
    assert_eq!(label.text(Field::Qty).map(|t| t.contains('৫')), Some(true));
}

#[test]
fn test_bengali_word_quantity_selects_bengali_captions() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({"name": "Soap", "qty": "দুই", "price": "80"}))
        .unwrap();
    let pass = engine.preview(&form).unwrap();
    let label = &pass.labels[0];
    assert_eq!(label.language, Language::Bengali);
    assert_eq!(label.text(Field::Price), Some("দাম: 80৳"));
}

// ============================================================================
// AUTO-SCALE
// ============================================================================

#[test]
fn test_oversized_fonts_shrink_but_stay_readable() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({
            "name": "Soap",
            "variation": "Lavender",
            "qty": "2",
            "price": "50",
            "fonts": {"name": "40", "variation": "40", "qty": "40", "price": "40"},
        }))
        .unwrap();

    let label = &engine.preview(&form).unwrap().labels[0];
    assert!(label.scale < 1.0);
    let sizes = text_sizes(label);
    assert!(!sizes.is_empty());
    assert!(sizes.iter().all(|s| (6..40).contains(s)), "{:?}", sizes);
}

#[test]
fn test_fitting_label_keeps_its_fonts() {
    let (_, engine) = memory_engine(BarcodeMode::PerProduct);
    let form = engine
        .form_from_json(&json!({
            "name": "Tea",
            "labelSize": "100x80",
            "show": {"qty": false, "pack": false, "exp": false},
        }))
        .unwrap();
    let label = &engine.preview(&form).unwrap().labels[0];
    assert_eq!(label.scale, 1.0);

    let data = normalize(&form);
    assert_eq!(text_sizes(label), vec![data.fonts.get(Field::Name)]);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_settings_and_products_persist_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store: SharedStore = Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let engine = LabelEngine::new(store, BarcodeMode::PerProduct);
        engine
            .settings()
            .patch(&SettingsPatch::rongta_3825_sample())
            .unwrap();
        let form = engine
            .form_from_json(&json!({"name": "Rice", "variation": "Miniket", "price": "75"}))
            .unwrap();
        engine.save_product(&form).unwrap();
    }

    let store: SharedStore = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let engine = LabelEngine::new(store, BarcodeMode::PerProduct);

    let settings = engine.settings().load();
    assert_eq!(settings.fonts, FontSizes::RONGTA_3825_SAMPLE);
    assert_eq!(settings.barcode.height, 23);

    let products = engine.products().list("mini");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Rice");

    let form = engine.initial_form();
    assert_eq!(form.name, "Rice");
    assert_eq!(form.price, "75");
}

#[test]
fn test_print_advances_sequence_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let job_form = json!({"name": "Soap", "labelCount": "2"});

    {
        let store: SharedStore = Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let engine = LabelEngine::new(store, BarcodeMode::Sequential);
        let form = engine.form_from_json(&job_form).unwrap();
        let job = engine.print(&form).unwrap();
        assert_eq!(job.pass.barcode, "00000001");
    }

    let store: SharedStore = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let engine = LabelEngine::new(store, BarcodeMode::Sequential);
    let form = engine.form_from_json(&job_form).unwrap();
    assert_eq!(engine.preview(&form).unwrap().barcode, "00000003");
}

//! Render-pass orchestration over the stores.

use serde::Serialize;
use serde_json::Value;

use super::{LabelDescriptor, render_copies};
use crate::barcode::{
    BarcodeMode, BarcodeValueResolver, BarcodersRenderer, SymbolRenderer, resolver_for,
};
use crate::error::Result;
use crate::label::LabelData;
use crate::normalize::{RawForm, normalize};
use crate::print::PageDirective;
use crate::store::{Product, ProductStore, SettingsPatch, SettingsStore, SharedStore};

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPass {
    /// The normalized record the labels were rendered from.
    pub data: LabelData,
    /// Barcode value resolved for this pass (copy 0).
    pub barcode: String,
    pub labels: Vec<LabelDescriptor>,
}

/// A render pass plus the page directive for printing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub page: PageDirective,
    #[serde(flatten)]
    pub pass: RenderPass,
}

/// Runs full render passes: normalize → resolve barcode → render × N.
///
/// One pass runs to completion before the next; callers sharing an engine
/// across threads serialize access (the server keeps it behind a mutex).
pub struct LabelEngine {
    settings: SettingsStore,
    products: ProductStore,
    resolver: Box<dyn BarcodeValueResolver>,
    symbols: Box<dyn SymbolRenderer>,
}

impl LabelEngine {
    pub fn new(store: SharedStore, mode: BarcodeMode) -> Self {
        let resolver = resolver_for(mode, store.clone());
        Self::with_resolver(store, resolver)
    }

    pub fn with_resolver(store: SharedStore, resolver: Box<dyn BarcodeValueResolver>) -> Self {
        Self {
            settings: SettingsStore::new(store.clone()),
            products: ProductStore::new(store),
            resolver,
            symbols: Box::new(BarcodersRenderer),
        }
    }

    pub fn with_symbol_renderer(mut self, symbols: Box<dyn SymbolRenderer>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn products(&self) -> &ProductStore {
        &self.products
    }

    pub fn barcode_mode(&self) -> BarcodeMode {
        self.resolver.mode()
    }

    /// The form as it looks on startup: settings defaults, then the last
    /// used product if it still exists.
    pub fn initial_form(&self) -> RawForm {
        let mut form = self.settings.load().seed_form();
        if let Some(product) = self.products.last_used() {
            product.apply_to(&mut form);
        }
        form
    }

    /// Build a form from settings, overlaid with a (partial) JSON form.
    pub fn form_from_json(&self, overrides: &Value) -> Result<RawForm> {
        self.settings.form_with(overrides)
    }

    /// Render a form without persisting anything but the auto barcode map.
    pub fn preview(&self, form: &RawForm) -> Result<RenderPass> {
        self.render_data(normalize(form))
    }

    /// A form field changed: persist price mode, label size and barcode
    /// settings, then re-render.
    pub fn form_changed(&self, form: &RawForm) -> Result<RenderPass> {
        let data = normalize(form);
        self.settings.patch(&SettingsPatch::form_changed(&data))?;
        self.render_data(data)
    }

    /// Render for printing and let the resolver advance its state.
    pub fn print(&self, form: &RawForm) -> Result<PrintJob> {
        let pass = self.preview(form)?;
        self.resolver
            .after_print(&pass.barcode, pass.data.label_count)?;
        tracing::info!(
            copies = pass.data.label_count,
            size = %pass.data.label_size,
            barcode = %pass.barcode,
            "print job prepared"
        );
        Ok(PrintJob {
            page: PageDirective::for_size(pass.data.label_size),
            pass,
        })
    }

    /// Save the current form as a product.
    pub fn save_product(&self, form: &RawForm) -> Result<Product> {
        self.products.save(&normalize(form))
    }

    /// Load a saved product into `form`.
    pub fn use_product(&self, id: &str, form: &mut RawForm) -> Result<Option<Product>> {
        self.products.use_product(id, form)
    }

    fn render_data(&self, data: LabelData) -> Result<RenderPass> {
        let (barcode, labels) = render_copies(&data, self.resolver.as_ref(), self.symbols.as_ref())?;
        Ok(RenderPass {
            data,
            barcode,
            labels,
        })
    }
}

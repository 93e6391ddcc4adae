//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::barcode::BarcodeMode;
use crate::error::Result;
use crate::render::LabelEngine;
use crate::store::{JsonFileStore, SharedStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Directory holding the JSON store
    pub store_dir: PathBuf,
    pub barcode_mode: BarcodeMode,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// One render pass at a time.
    pub engine: Mutex<LabelEngine>,
}

impl AppState {
    /// Open the file store named by `config`.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store: SharedStore = Arc::new(JsonFileStore::open(&config.store_dir)?);
        Ok(Self::with_store(config, store))
    }

    /// State over an already opened store.
    pub fn with_store(config: ServerConfig, store: SharedStore) -> Self {
        let engine = LabelEngine::new(store, config.barcode_mode);
        Self {
            config,
            engine: Mutex::new(engine),
        }
    }
}

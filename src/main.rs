//! # Pricetag CLI
//!
//! Command-line interface for price label rendering.
//!
//! ## Usage
//!
//! ```bash
//! # Render a form and show the label descriptors
//! pricetag render form.json
//!
//! # Save a PNG preview sheet
//! pricetag render --png labels.png form.json
//!
//! # Prepare a print job (advances the sequential barcode counter)
//! pricetag --barcode-mode sequential print --out ./job form.json
//!
//! # Saved products and settings
//! pricetag products list --search soap
//! pricetag settings preset
//!
//! # Run the HTTP API
//! pricetag serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pricetag::{
    PricetagError,
    barcode::BarcodeMode,
    locale::UnitMenu,
    normalize::RawForm,
    preview::{PreviewOptions, render_sheet},
    render::LabelEngine,
    server::{self, ServerConfig},
    store::{JsonFileStore, SettingsPatch, SharedStore},
};

/// Pricetag - Price label renderer
#[derive(Parser, Debug)]
#[command(name = "pricetag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding settings and saved products
    #[arg(long, global = true, env = "PRICETAG_STORE", default_value = ".pricetag")]
    store: PathBuf,

    /// How auto-generated barcode values are chosen
    #[arg(
        long,
        global = true,
        env = "PRICETAG_BARCODE_MODE",
        default_value = "per-product"
    )]
    barcode_mode: BarcodeMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a form (JSON file, `-` for stdin) and print the labels as JSON
    Render {
        form: PathBuf,

        /// Save a PNG preview sheet instead
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Preview pixels per label pixel
        #[arg(long, default_value = "3")]
        scale: usize,

        /// Labels per sheet row
        #[arg(long, default_value = "3")]
        columns: usize,
    },

    /// Prepare a print job: page directive, labels and a preview sheet
    Print {
        form: PathBuf,

        /// Output directory for job.json and sheet.png
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },

    /// Manage saved products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show the quantity-unit menu for a quantity
    Units {
        qty: String,

        /// Currently selected unit value
        #[arg(long, default_value = "")]
        current: String,
    },

    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

#[derive(Subcommand, Debug)]
enum ProductAction {
    /// List saved products, newest first
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Save a form as a product
    Save { form: PathBuf },
    /// Load a product into the default form and print it
    Use { id: String },
    /// Delete one product
    Delete { id: String },
    /// Delete every product
    Clear,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the effective settings
    Show,
    /// Restore all defaults
    Reset,
    /// Toggle whole-label bold text
    Bold,
    /// Toggle the UI theme
    Theme,
    /// Apply the Rongta 38x25 sample font sizes
    Preset,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pricetag=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PricetagError> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Serve { listen } => {
            return server::serve(ServerConfig {
                listen_addr: listen,
                store_dir: cli.store,
                barcode_mode: cli.barcode_mode,
            })
            .await;
        }
        other => other,
    };

    let store: SharedStore = Arc::new(JsonFileStore::open(&cli.store)?);
    let engine = LabelEngine::new(store, cli.barcode_mode);

    match command {
        Commands::Render {
            form,
            png,
            scale,
            columns,
        } => {
            let form = read_form(&engine, &form)?;
            let pass = engine.preview(&form)?;

            if let Some(png_path) = png {
                let options = PreviewOptions {
                    scale: scale.max(1),
                    columns: columns.max(1),
                    ..PreviewOptions::default()
                };
                fs::write(&png_path, render_sheet(&pass.labels, &options)?)?;
                println!(
                    "Saved {} label(s) to {}",
                    pass.labels.len(),
                    png_path.display()
                );
            } else {
                print_json(&pass)?;
            }
        }

        Commands::Print { form, out } => {
            let form = read_form(&engine, &form)?;
            let job = engine.print(&form)?;

            fs::create_dir_all(&out)?;
            fs::write(out.join("job.json"), serde_json::to_vec_pretty(&job)?)?;
            fs::write(
                out.join("sheet.png"),
                render_sheet(&job.pass.labels, &PreviewOptions::default())?,
            )?;
            println!(
                "Prepared {} label(s), barcode {}, {}",
                job.pass.labels.len(),
                job.pass.barcode,
                job.page
            );
        }

        Commands::Products { action } => match action {
            ProductAction::List { search } => {
                let products = engine.products().list(&search);
                if products.is_empty() {
                    println!("No saved products");
                }
                for p in products {
                    let variation = if p.variation.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", p.variation)
                    };
                    println!("{}  {}{}  {}", p.id, p.name, variation, p.price);
                }
            }
            ProductAction::Save { form } => {
                let form = read_form(&engine, &form)?;
                let product = engine.save_product(&form)?;
                println!("Saved {} as {}", product.name, product.id);
            }
            ProductAction::Use { id } => {
                let mut form = engine.settings().load().seed_form();
                match engine.use_product(&id, &mut form)? {
                    Some(_) => print_json(&form)?,
                    None => return Err(unknown_product(&id)),
                }
            }
            ProductAction::Delete { id } => {
                if !engine.products().delete(&id)? {
                    return Err(unknown_product(&id));
                }
                println!("Deleted {}", id);
            }
            ProductAction::Clear => {
                engine.products().clear()?;
                println!("Cleared saved products");
            }
        },

        Commands::Settings { action } => match action {
            SettingsAction::Show => print_json(&engine.settings().load())?,
            SettingsAction::Reset => print_json(&engine.settings().reset()?)?,
            SettingsAction::Bold => {
                let active = engine.settings().toggle_bold_text()?;
                println!("Bold text {}", if active { "on" } else { "off" });
            }
            SettingsAction::Theme => {
                let theme = engine.settings().toggle_theme()?;
                println!("Theme {:?}", theme);
            }
            SettingsAction::Preset => {
                let settings = engine
                    .settings()
                    .patch(&SettingsPatch::rongta_3825_sample())?;
                print_json(&settings)?;
            }
        },

        Commands::Units { qty, current } => {
            print_json(&UnitMenu::for_quantity(&qty, &current))?;
        }

        Commands::Serve { .. } => {}
    }

    Ok(())
}

/// Read a (partial) JSON form from a file, or stdin for `-`.
fn read_form(engine: &LabelEngine, path: &Path) -> Result<RawForm, PricetagError> {
    let text = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        fs::read_to_string(path)?
    };
    let value: serde_json::Value = serde_json::from_str(&text)?;
    engine.form_from_json(&value)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), PricetagError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn unknown_product(id: &str) -> PricetagError {
    PricetagError::InvalidInput(format!("no saved product with id '{}'", id))
}

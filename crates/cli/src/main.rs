//! QRMaster CLI - Local product, cart, scan and sales store

mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use qrmaster_core::application::repository::DEFAULT_SALES_LIMIT;
use qrmaster_core::domain::{
    CartLine, MapPost, PaymentMethod, PostPayload, Product, ProductPatch, QrCodeRecord, Sale,
    ScanHistoryEntry, ScanKind,
};
use qrmaster_core::port::DurableStore;
use qrmaster_core::{Database, StoreError};
use qrmaster_infra_sqlite::{SqliteBackendFactory, StoreConfig};
use qrmaster_infra_storage::{FileDurableStore, JsonFileLegacySource};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Table;
use tracing::info;

#[derive(Parser)]
#[command(name = "qrmaster")]
#[command(about = "QRMaster local store CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra configuration file (TOML)
    #[arg(long, env = "QRMASTER_CONFIG")]
    config: Option<PathBuf>,

    /// Print lists as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Product catalog
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Active cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },

    /// Scan history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Saved QR codes
    Qrcodes {
        #[command(subcommand)]
        command: QrCodeCommands,
    },

    /// Completed sales
    Sales {
        #[command(subcommand)]
        command: SalesCommands,
    },

    /// Social map posts
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Key/value settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Delete all stored data
    Reset {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },

    /// Show backend and storage information
    Info,
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List all products
    List,
    /// Add a product
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        barcode: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "0")]
        stock: i64,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change some fields of a product
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        stock: Option<i64>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a product
    Delete { id: String },
    /// Look up a product by barcode
    Find { barcode: String },
    /// Search name, barcode and description
    Search { term: String },
    /// Products at or below a stock level
    LowStock {
        #[arg(long, default_value = "5")]
        threshold: i64,
    },
}

#[derive(Subcommand)]
enum CartCommands {
    /// List cart lines and total
    List,
    /// Add a product (by id or barcode) to the cart
    Add {
        product: String,
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },
    /// Set the quantity of a line
    Set { id: String, quantity: i64 },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Turn the cart into a sale and empty it
    Checkout {
        #[arg(long, value_enum, default_value = "cash")]
        payment: PaymentArg,
        /// Cash handed over (defaults to the exact total)
        #[arg(long)]
        cash: Option<f64>,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Newest scans first
    List {
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
    /// Record a scan
    Add {
        content: String,
        #[arg(long = "type", value_enum)]
        kind: Option<ScanKindArg>,
    },
    /// Delete one scan
    Delete { id: String },
    /// Delete all scans
    Clear,
}

#[derive(Subcommand)]
enum QrCodeCommands {
    /// Newest codes first
    List {
        #[arg(short = 'n', long)]
        limit: Option<u32>,
        /// Only codes of this type
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Save a generated code
    Add {
        content: String,
        #[arg(long = "type", default_value = "text")]
        kind: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a code
    Delete { id: String },
}

#[derive(Subcommand)]
enum SalesCommands {
    /// Newest sales first
    List {
        #[arg(short = 'n', long, default_value_t = DEFAULT_SALES_LIMIT)]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Newest posts first
    List,
    /// Publish a post; pass the payload matching --type
    Add {
        #[arg(long = "type", value_enum)]
        kind: PostTypeArg,
        /// Photo URI, music link, audio URI, QR content or note text
        #[arg(long)]
        payload: String,
        /// QR type, for --type qr
        #[arg(long, default_value = "text")]
        qr_type: String,
        #[arg(long, default_value = "")]
        caption: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, default_value = "")]
        user: String,
    },
    /// Delete a post
    Delete { id: String },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Read one value
    Get { key: String },
    /// Write one value
    Set { key: String, value: String },
    /// List all settings
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaymentArg {
    Cash,
    Card,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Cash => PaymentMethod::Cash,
            PaymentArg::Card => PaymentMethod::Card,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScanKindArg {
    Url,
    Wifi,
    Email,
    Barcode,
    Text,
}

impl From<ScanKindArg> for ScanKind {
    fn from(arg: ScanKindArg) -> Self {
        match arg {
            ScanKindArg::Url => ScanKind::Url,
            ScanKindArg::Wifi => ScanKind::Wifi,
            ScanKindArg::Email => ScanKind::Email,
            ScanKindArg::Barcode => ScanKind::Barcode,
            ScanKindArg::Text => ScanKind::Text,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PostTypeArg {
    Photo,
    Music,
    Audio,
    Qr,
    Note,
}

/// Guess the kind of scanned content when none is given
fn classify(content: &str) -> ScanKind {
    let lower = content.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        ScanKind::Url
    } else if lower.starts_with("wifi:") {
        ScanKind::Wifi
    } else if lower.starts_with("mailto:") || (content.contains('@') && !content.contains(' ')) {
        ScanKind::Email
    } else if !content.is_empty() && content.chars().all(|c| c.is_ascii_digit()) {
        ScanKind::Barcode
    } else {
        ScanKind::Text
    }
}

fn print_list<T, R>(items: &[T], json: bool) -> Result<()>
where
    T: Serialize,
    R: tabled::Tabled + for<'a> From<&'a T>,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else if items.is_empty() {
        println!("{}", "(empty)".dimmed());
    } else {
        let rows: Vec<R> = items.iter().map(R::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn affected_message(what: &str, id: &str, verb: &str, affected: u64) -> String {
    if affected == 0 {
        format!("○ No {} with id {}", what, id)
    } else {
        format!("✓ {} {} {}", what, id, verb)
    }
}

fn print_affected(what: &str, id: &str, verb: &str, affected: u64) {
    let message = affected_message(what, id, verb, affected);
    if affected == 0 {
        println!("{}", message.yellow());
    } else {
        println!("{}", message.green().bold());
    }
}

fn build_database(config: &StoreConfig) -> Database {
    let durable_store: Arc<dyn DurableStore> =
        Arc::new(FileDurableStore::new(&config.durable_store_dir));
    let factory = SqliteBackendFactory::from_config(config, durable_store);

    let mut builder = Database::builder(Arc::new(factory));
    if let Some(dir) = &config.legacy_dir {
        builder = builder.legacy_source(Arc::new(JsonFileLegacySource::new(dir)));
    }
    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    settings::init_logging()?;
    let cli = Cli::parse();

    let config = settings::load_config(cli.config.as_deref())?;
    info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let db = build_database(&config);
    let outcome = run(&db, &config, cli.command, cli.json).await;

    // Close even after a failed command so pending durable writes land
    db.close().await.context("Failed to close store")?;
    outcome
}

async fn run(db: &Database, config: &StoreConfig, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Products { command } => run_products(db, command, json).await,
        Commands::Cart { command } => run_cart(db, command, json).await,
        Commands::History { command } => run_history(db, command, json).await,
        Commands::Qrcodes { command } => run_qr_codes(db, command, json).await,
        Commands::Sales { command } => match command {
            SalesCommands::List { limit } => {
                let sales = db.sales().list(limit).await?;
                print_list::<Sale, output::SaleRow>(&sales, json)
            }
        },
        Commands::Posts { command } => run_posts(db, command, json).await,
        Commands::Settings { command } => run_settings(db, command, json).await,
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete all data without --yes");
            }
            db.reset().await?;
            println!("{}", "✓ All data deleted".green().bold());
            Ok(())
        }
        Commands::Info => {
            db.ensure_initialized()
                .await
                .context("Store is unavailable")?;
            let kind = db
                .backend_kind()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "none".to_string());

            println!("{}", "QRMaster Store".cyan().bold());
            println!();
            println!("  {} {}", "Version:".bold(), qrmaster_core::VERSION);
            println!("  {} {}", "Backend:".bold(), kind);
            println!("  {} {}", "Database:".bold(), config.database_path().display());
            println!("  {} {}", "Durable store:".bold(), config.durable_store_dir.display());
            println!("  {} {}", "Products:".bold(), db.products().list().await?.len());
            println!("  {} {}", "Cart lines:".bold(), db.cart().list().await?.len());
            println!("  {} {}", "Scans:".bold(), db.scan_history().list(None).await?.len());
            Ok(())
        }
    }
}

async fn run_products(db: &Database, command: ProductCommands, json: bool) -> Result<()> {
    match command {
        ProductCommands::List => {
            let products = db.products().list().await?;
            print_list::<Product, output::ProductRow>(&products, json)
        }
        ProductCommands::Add {
            name,
            price,
            barcode,
            category,
            stock,
            image,
            description,
        } => {
            let mut product = Product::new(
                db.new_id(),
                name,
                price,
                barcode,
                category,
                stock,
                db.now_millis(),
            );
            product.image = image;
            product.description = description;

            match db.products().add(&product).await {
                Ok(()) => {
                    println!("{}", format!("✓ Product {} added", product.id).green().bold());
                    Ok(())
                }
                Err(StoreError::ConstraintViolation(_)) => {
                    anyhow::bail!("A product with barcode {} already exists", product.barcode)
                }
                Err(e) => Err(e.into()),
            }
        }
        ProductCommands::Update {
            id,
            name,
            price,
            barcode,
            category,
            stock,
            image,
            description,
        } => {
            let patch = ProductPatch {
                name,
                price,
                barcode,
                category,
                stock,
                image,
                description,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to update");
            }
            let affected = db.products().update(&id, patch).await?;
            print_affected("Product", &id, "updated", affected);
            Ok(())
        }
        ProductCommands::Delete { id } => {
            let affected = db.products().delete(&id).await?;
            print_affected("Product", &id, "deleted", affected);
            Ok(())
        }
        ProductCommands::Find { barcode } => {
            let found: Vec<Product> = db
                .products()
                .find_by_barcode(&barcode)
                .await?
                .into_iter()
                .collect();
            print_list::<Product, output::ProductRow>(&found, json)
        }
        ProductCommands::Search { term } => {
            let products = db.products().search(&term).await?;
            print_list::<Product, output::ProductRow>(&products, json)
        }
        ProductCommands::LowStock { threshold } => {
            let products = db.products().low_stock(threshold).await?;
            print_list::<Product, output::ProductRow>(&products, json)
        }
    }
}

async fn run_cart(db: &Database, command: CartCommands, json: bool) -> Result<()> {
    match command {
        CartCommands::List => {
            let lines = db.cart().list().await?;
            print_list::<CartLine, output::CartRow>(&lines, json)?;
            if !json && !lines.is_empty() {
                println!("  {} {:.2}", "Total:".bold(), db.cart().total().await?);
            }
            Ok(())
        }
        CartCommands::Add { product, quantity } => {
            let found = match db.products().find_by_id(&product).await? {
                Some(p) => Some(p),
                None => db.products().find_by_barcode(&product).await?,
            };
            let product =
                found.with_context(|| format!("No product with id or barcode {}", product))?;

            db.cart()
                .add(&CartLine::from_product(&product, quantity))
                .await?;
            println!(
                "{}",
                format!("✓ {} x {} added to cart", quantity, product.name)
                    .green()
                    .bold()
            );
            Ok(())
        }
        CartCommands::Set { id, quantity } => {
            let affected = db.cart().set_quantity(&id, quantity).await?;
            print_affected("Cart line", &id, "updated", affected);
            Ok(())
        }
        CartCommands::Remove { id } => {
            let affected = db.cart().remove(&id).await?;
            print_affected("Cart line", &id, "removed", affected);
            Ok(())
        }
        CartCommands::Clear => {
            let removed = db.cart().clear().await?;
            println!("{}", format!("✓ {} lines removed", removed).green().bold());
            Ok(())
        }
        CartCommands::Checkout { payment, cash } => {
            let lines = db.cart().list().await?;
            let sale = Sale::checkout(db.new_id(), &lines, payment.into(), cash, db.now_millis())
                .map_err(StoreError::from)?;

            db.sales().add(&sale).await?;
            db.cart().clear().await?;

            println!("{}", format!("✓ Sale {} recorded", sale.id).green().bold());
            println!("  {} {:.2}", "Total:".bold(), sale.total);
            if let Some(change) = sale.change {
                println!("  {} {:.2}", "Change:".bold(), change);
            }
            Ok(())
        }
    }
}

async fn run_history(db: &Database, command: HistoryCommands, json: bool) -> Result<()> {
    match command {
        HistoryCommands::List { limit } => {
            let entries = db.scan_history().list(limit).await?;
            print_list::<ScanHistoryEntry, output::ScanRow>(&entries, json)
        }
        HistoryCommands::Add { content, kind } => {
            let entry = ScanHistoryEntry {
                id: db.new_id(),
                kind: kind.map(ScanKind::from).unwrap_or_else(|| classify(&content)),
                content,
                timestamp: db.now_millis(),
            };
            db.scan_history().add(&entry).await?;
            println!(
                "{}",
                format!("✓ Scan {} recorded as {}", entry.id, entry.kind).green().bold()
            );
            Ok(())
        }
        HistoryCommands::Delete { id } => {
            let affected = db.scan_history().delete(&id).await?;
            print_affected("Scan", &id, "deleted", affected);
            Ok(())
        }
        HistoryCommands::Clear => {
            let removed = db.scan_history().clear().await?;
            println!("{}", format!("✓ {} scans removed", removed).green().bold());
            Ok(())
        }
    }
}

async fn run_qr_codes(db: &Database, command: QrCodeCommands, json: bool) -> Result<()> {
    match command {
        QrCodeCommands::List { limit, kind } => {
            let mut records = match kind {
                Some(kind) => db.qr_codes().list_by_type(&kind).await?,
                None => db.qr_codes().list(limit).await?,
            };
            if let Some(limit) = limit {
                records.truncate(limit as usize);
            }
            print_list::<QrCodeRecord, output::ScanRow>(&records, json)
        }
        QrCodeCommands::Add {
            content,
            kind,
            image,
        } => {
            let record = QrCodeRecord {
                id: db.new_id(),
                content,
                kind,
                timestamp: db.now_millis(),
                image,
            };
            db.qr_codes().add(&record).await?;
            println!("{}", format!("✓ QR code {} saved", record.id).green().bold());
            Ok(())
        }
        QrCodeCommands::Delete { id } => {
            let affected = db.qr_codes().delete(&id).await?;
            print_affected("QR code", &id, "deleted", affected);
            Ok(())
        }
    }
}

async fn run_posts(db: &Database, command: PostCommands, json: bool) -> Result<()> {
    match command {
        PostCommands::List => {
            let posts = db.map_posts().list().await?;
            print_list::<MapPost, output::PostRow>(&posts, json)
        }
        PostCommands::Add {
            kind,
            payload,
            qr_type,
            caption,
            lat,
            lng,
            user,
        } => {
            let payload = match kind {
                PostTypeArg::Photo => PostPayload::Photo { photo: payload },
                PostTypeArg::Music => PostPayload::Music { music: payload },
                PostTypeArg::Audio => PostPayload::Audio { audio: payload },
                PostTypeArg::Qr => PostPayload::Qr {
                    qr_code: payload,
                    qr_type,
                },
                PostTypeArg::Note => PostPayload::Note { note: payload },
            };
            let post = MapPost {
                id: db.new_id(),
                payload,
                caption,
                latitude: lat,
                longitude: lng,
                timestamp: db.now_millis(),
                user_name: user,
            };
            db.map_posts().add(&post).await?;
            println!("{}", format!("✓ Post {} published", post.id).green().bold());
            Ok(())
        }
        PostCommands::Delete { id } => {
            let affected = db.map_posts().delete(&id).await?;
            print_affected("Post", &id, "deleted", affected);
            Ok(())
        }
    }
}

async fn run_settings(db: &Database, command: SettingsCommands, json: bool) -> Result<()> {
    match command {
        SettingsCommands::Get { key } => {
            match db.settings().get(&key).await? {
                Some(value) => println!("{}", value),
                None => println!("{}", format!("○ {} is not set", key).yellow()),
            }
            Ok(())
        }
        SettingsCommands::Set { key, value } => {
            db.settings().set(&key, &value).await?;
            println!("{}", format!("✓ {} = {}", key, value).green().bold());
            Ok(())
        }
        SettingsCommands::List => {
            let entries = db.settings().all().await?;
            print_list::<_, output::SettingRow>(&entries, json)
        }
    }
}

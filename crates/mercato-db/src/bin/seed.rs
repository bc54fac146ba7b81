//! # Seed Data Generator
//!
//! Populates a development database with vendors, their locations, products
//! and opening stock.
//!
//! ## Usage
//! ```bash
//! # 3 vendors x 20 products (default)
//! cargo run -p mercato-db --bin seed
//!
//! # Custom amounts
//! cargo run -p mercato-db --bin seed -- --vendors 5 --products 50
//!
//! # Specify database path
//! cargo run -p mercato-db --bin seed -- --db ./data/mercato.db
//! ```
//!
//! ## Generated Data
//! Each vendor gets:
//! - Two locations: `Main Warehouse` and `Storefront`
//! - Products cycling through a small catalog, SKU `{VENDOR}-{CODE}-{INDEX}`
//! - Opening stock written through [`InventoryService`], so every unit has
//!   a `restock` movement behind it
//!
//! Stock levels are spread so the dashboard shows every class: out of
//! stock, low, adequate and overstock.

use std::env;

use mercato_core::{InventoryLocation, MovementReason, Product, SyncConfig, Vendor};
use mercato_db::{Database, DbConfig, InventoryService};

/// Vendor names for the generated marketplace
const VENDORS: &[(&str, &str)] = &[
    ("NRD", "Nordic Ceramics"),
    ("FLD", "Fieldwork Outfitters"),
    ("PAP", "Paper & Ink Co"),
    ("GRN", "Greenhouse Botanicals"),
    ("TDL", "Tidal Audio"),
];

/// (code, name, base price in cents)
const CATALOG: &[(&str, &str, i64)] = &[
    ("MUG", "Stoneware Mug", 1800),
    ("BWL", "Serving Bowl", 3400),
    ("TOT", "Canvas Tote", 2500),
    ("NTB", "Dot Grid Notebook", 1400),
    ("PEN", "Brass Pen", 4200),
    ("PLT", "Potted Fern", 2900),
    ("SPK", "Desk Speaker", 8900),
    ("CBL", "Braided Cable", 1200),
    ("CND", "Soy Candle", 2200),
    ("BLK", "Wool Blanket", 11900),
];

/// Opening stock pattern: out of stock, low, adequate, overstock
const STOCK_LEVELS: &[i64] = &[0, 3, 25, 60, 140];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut vendor_count: usize = 3;
    let mut products_per_vendor: usize = 20;
    let mut db_path = String::from("./mercato_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--vendors" | "-v" => {
                if i + 1 < args.len() {
                    vendor_count = args[i + 1].parse().unwrap_or(3).min(VENDORS.len());
                    i += 1;
                }
            }
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    products_per_vendor = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mercato Inventory Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -v, --vendors <N>   Number of vendors (default: 3, max: {})", VENDORS.len());
                println!("  -p, --products <N>  Products per vendor (default: 20)");
                println!("  -d, --db <PATH>     Database file path (default: ./mercato_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mercato Inventory Seed Data Generator");
    println!("========================================");
    println!("Database: {}", db_path);
    println!("Vendors:  {}", vendor_count);
    println!("Products: {} per vendor", products_per_vendor);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.vendors().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} vendors", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let service = InventoryService::new(db.clone());
    let start = std::time::Instant::now();
    let mut products_created = 0;
    let mut units_stocked = 0;

    for (code, name) in VENDORS.iter().take(vendor_count) {
        let vendor = db.vendors().insert(&Vendor::new(*name)).await?;
        let warehouse = db
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, "Main Warehouse"))
            .await?;
        let storefront = db
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, "Storefront"))
            .await?;
        let sync = SyncConfig::disabled(&vendor.id);

        println!();
        println!("Vendor {} ({})", name, vendor.id);

        for index in 0..products_per_vendor {
            let product = generate_product(&vendor.id, code, index);
            if let Err(e) = product.validate() {
                eprintln!("Skipping {}: {}", product.sku, e);
                continue;
            }
            let product = match db.products().insert(&product).await {
                Ok(product) => product,
                Err(e) => {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
            };
            products_created += 1;

            let quantity = STOCK_LEVELS[index % STOCK_LEVELS.len()];
            if quantity == 0 {
                continue;
            }

            // Most stock in the warehouse, a few units out front
            let front = quantity / 5;
            for (location, qty) in [(&warehouse, quantity - front), (&storefront, front)] {
                if qty == 0 {
                    continue;
                }
                service
                    .update_location_inventory(
                        &sync,
                        &product.id,
                        &location.id,
                        qty,
                        MovementReason::Restock,
                        Some("opening stock"),
                    )
                    .await?;
                units_stocked += qty;
            }
        }

        let totals = service.get_total_for_vendor(&vendor.id).await?;
        println!(
            "  {} units on hand across {} locations",
            totals.on_hand_quantity, totals.location_count
        );
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Created {} products and stocked {} units in {:?}",
        products_created, units_stocked, elapsed
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one catalog product for a vendor.
fn generate_product(vendor_id: &str, vendor_code: &str, index: usize) -> Product {
    let (code, name, base_price) = CATALOG[index % CATALOG.len()];
    let edition = index / CATALOG.len();

    let sku = format!("{}-{}-{:03}", vendor_code, code, index);
    let name = if edition == 0 {
        name.to_string()
    } else {
        format!("{} No. {}", name, edition + 1)
    };

    // Later editions cost a little more
    let price_cents = base_price + (edition as i64) * 150;

    Product::new(vendor_id, sku, name, price_cents)
}

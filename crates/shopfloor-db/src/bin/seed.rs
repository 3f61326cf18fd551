//! # Seed Data Generator
//!
//! Populates a database with development data.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p shopfloor-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p shopfloor-db --bin seed -- --count 1000 --db ./data/shopfloor.db
//! ```
//!
//! ## What Gets Created
//! - User `admin` / `admin123` (role admin)
//! - One category per product family below
//! - `count` products with generated barcodes and varied prices / stock
//! - Discounts `TENOFF` (10%) and `FIFTY` (50.00 fixed)

use std::env;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use shopfloor_core::{DiscountKind, NewDiscount, NewProduct, NewUser, Role};
use shopfloor_db::{Database, DbConfig};

/// Product families for realistic test data
const FAMILIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Cola", "Lemon Soda", "Orange Juice", "Mango Juice", "Mineral Water", "Iced Tea",
            "Green Tea", "Coffee Beans", "Energy Drink", "Lassi",
        ],
    ),
    (
        "Snacks",
        &[
            "Potato Chips", "Nachos", "Salted Peanuts", "Chocolate Bar", "Butter Cookies",
            "Cream Biscuits", "Popcorn", "Pretzels", "Trail Mix", "Wafer Rolls",
        ],
    ),
    (
        "Dairy",
        &[
            "Whole Milk", "Toned Milk", "Paneer", "Cheddar Cheese", "Butter", "Greek Yogurt",
            "Curd", "Fresh Cream", "Ghee", "Eggs Dozen",
        ],
    ),
    (
        "Grocery",
        &[
            "Basmati Rice", "Wheat Flour", "Red Lentils", "Chickpeas", "Sugar", "Sea Salt",
            "Sunflower Oil", "Spaghetti", "Tomato Ketchup", "Honey",
        ],
    ),
    (
        "Household",
        &[
            "Dish Soap", "Laundry Powder", "Floor Cleaner", "Paper Towels", "Trash Bags",
            "Sponges", "Hand Wash", "Toilet Rolls", "Glass Cleaner", "Matches",
        ],
    ),
];

/// Size variants and their price addon in cents
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 2500),
    ("Large", 5000),
    ("Family Pack", 12000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./shopfloor_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Shopfloor Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopfloor_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Shopfloor Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Admin user
    if db.users().find_by_username("admin").await?.is_none() {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(b"admin123", &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        db.users()
            .create(NewUser {
                username: "admin".to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await?;
        println!("✓ Created user admin / admin123");
    }

    // Products
    let start = std::time::Instant::now();
    let mut generated = 0;

    'families: for (family_idx, (family, names)) in FAMILIES.iter().enumerate() {
        let category = match db.categories().find_by_name(family).await? {
            Some(c) => c,
            None => db.categories().create(family).await?,
        };

        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'families;
                }

                let seed = family_idx * 1000 + name_idx * 20 + size_idx;
                let product = generate_product(name, size, *addon, category.id, seed);
                if let Err(e) = db.products().create(product).await {
                    eprintln!("Failed to insert {} {}: {}", name, size, e);
                    continue;
                }

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    // Discounts
    for (name, kind, value) in [
        ("TENOFF", DiscountKind::Percentage, 1000),
        ("FIFTY", DiscountKind::Fixed, 5000),
    ] {
        let new = NewDiscount {
            name: name.to_string(),
            kind,
            value,
        };
        match db.discounts().create(new).await {
            Ok(d) => println!("✓ Created discount {}", d.name),
            Err(e) if e.is_unique_violation() => println!("  Discount {} already exists", name),
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!("✓ Seed complete!");
    db.close().await;

    Ok(())
}

/// Builds one product with deterministic pseudo-random prices and stock.
fn generate_product(name: &str, size: &str, addon: i64, category_id: i64, seed: usize) -> NewProduct {
    // 19.00 - 198.00 base + size addon
    let selling_price_cents = 1900 + ((seed * 37) % 180) as i64 * 100 + addon;
    // Cost 60-80% of selling
    let cost_pct = 60 + (seed % 20) as i64;

    NewProduct {
        name: format!("{} {}", name, size),
        cost_price_cents: selling_price_cents * cost_pct / 100,
        selling_price_cents,
        quantity: (seed % 51) as i64,
        category_id: Some(category_id),
        barcode: None,
    }
}

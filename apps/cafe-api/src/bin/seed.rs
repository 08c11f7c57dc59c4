//! # Seed Data
//!
//! Fills a fresh database with the menu categories, a starter menu and a
//! back-office account.
//!
//! ## Usage
//! ```bash
//! # Seed ./cafe.db with admin / admin123
//! cargo run -p cafe-api --bin seed
//!
//! # Custom admin and database
//! cargo run -p cafe-api --bin seed -- --admin-user manager --admin-password 's3cret!' --db ./data/cafe.db
//! ```
//!
//! Each step is skipped when its table already has rows, so running the
//! seeder twice is harmless.

use std::env;

use anyhow::Context;
use cafe_api::auth::hash_password;
use cafe_core::validation::{validate_password, validate_username};
use cafe_db::{Database, DbConfig, NewAdmin, NewMenuItem};

const CATEGORIES: &[&str] = &["Coffee", "Tea", "Coolers", "Snacks", "Desserts"];

/// (category, name, description, price in paise)
const STARTER_MENU: &[(&str, &str, &str, i64)] = &[
    ("Coffee", "Filter Coffee", "South Indian decoction with hot milk", 6_000),
    ("Coffee", "Cappuccino", "Double shot with steamed milk foam", 14_000),
    ("Coffee", "Cold Coffee", "Blended with ice cream", 16_000),
    ("Tea", "Masala Chai", "Ginger, cardamom and clove", 5_000),
    ("Tea", "Lemon Iced Tea", "Black tea shaken with lemon", 11_000),
    ("Coolers", "Mint Mojito", "Fresh mint, lime and soda", 13_000),
    ("Snacks", "Veg Sandwich", "Grilled with green chutney", 12_000),
    ("Snacks", "Paneer Puff", "Flaky pastry, spiced paneer", 7_000),
    ("Desserts", "Brownie", "Walnut brownie, served warm", 11_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "./cafe.db".to_string());
    let mut admin_user = String::from("admin");
    let mut admin_password = String::from("admin123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-user" => {
                if i + 1 < args.len() {
                    admin_user = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kube Café Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>              Database path (default: $DATABASE_URL or ./cafe.db)");
                println!("      --admin-user <NAME>      Admin username (default: admin)");
                println!("      --admin-password <PW>    Admin password (default: admin123)");
                println!("  -h, --help                   Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    validate_username(&admin_user).context("Invalid --admin-user")?;
    validate_password(&admin_password).context("Invalid --admin-password")?;

    println!("🌱 Kube Café Seed Data");
    println!("======================");
    println!("Database: {}", db_url);
    println!();

    let db = Database::new(DbConfig::from_url(&db_url))
        .await
        .context("Failed to open database")?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Categories are idempotent on their own
    for name in CATEGORIES {
        db.menu().ensure_category(name).await?;
    }
    println!("✓ {} categories", CATEGORIES.len());

    let existing = db.menu().count().await?;
    if existing > 0 {
        println!("⚠ Menu already has {} items, skipping starter menu", existing);
    } else {
        let categories = db.menu().categories().await?;
        for (category, name, description, price_cents) in STARTER_MENU {
            let category_id = categories
                .iter()
                .find(|c| c.name == *category)
                .map(|c| c.id);

            db.menu()
                .create(&NewMenuItem {
                    name: name.to_string(),
                    category_id,
                    description: Some(description.to_string()),
                    price_cents: *price_cents,
                    image: None,
                })
                .await
                .with_context(|| format!("Failed to insert {name}"))?;
        }
        println!("✓ {} menu items", STARTER_MENU.len());
    }

    if db.admins().find_by_username(&admin_user).await?.is_some() {
        println!("⚠ Admin '{}' already exists, skipping", admin_user);
    } else {
        let password_hash = hash_password(&admin_password)?;
        db.admins()
            .create(&NewAdmin {
                username: admin_user.clone(),
                email: None,
                password_hash,
            })
            .await?;
        println!("✓ Admin '{}' created", admin_user);
    }

    db.close().await;
    println!();
    println!("Done.");
    Ok(())
}

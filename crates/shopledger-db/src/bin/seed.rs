//! # Seed Data Generator
//!
//! Populates a development database with a demo organization: locations,
//! customers, a product catalog with stock, the default VAT rule, a batch
//! of sales run through the transaction engine, and a few expenses. Prints
//! a monthly summary at the end so the analytics pipeline can be eyeballed.
//!
//! ## Usage
//! ```bash
//! # Default database path (./shopledger_dev.db)
//! cargo run -p shopledger-db --bin seed
//!
//! # Custom path
//! cargo run -p shopledger-db --bin seed -- --db ./data/shopledger.db
//! ```

use std::env;

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use shopledger_db::repository::customer::NewCustomer;
use shopledger_db::repository::expense::NewExpense;
use shopledger_db::repository::location::NewLocation;
use shopledger_db::repository::organization::NewOrganization;
use shopledger_db::repository::product::NewProduct;
use shopledger_db::repository::sale::OrgContext;
use shopledger_db::{Database, DbConfig, EngineConfig};
use shopledger_core::{ReportPeriod, SaleDraft, SaleLineInput};

/// Demo catalog: (sku, name, price_cents, cost_cents, tax_exempt).
/// Staple foods are VAT-exempt.
const CATALOG: &[(&str, &str, i64, i64, bool)] = &[
    ("BEV-COLA-50CL", "Cola 50cl", 35_000, 25_000, false),
    ("BEV-WATER-75CL", "Bottled Water 75cl", 20_000, 12_000, false),
    ("BEV-MALT-33CL", "Malt Drink 33cl", 45_000, 32_000, false),
    ("PRV-RICE-5KG", "Parboiled Rice 5kg", 850_000, 700_000, true),
    ("PRV-GARRI-2KG", "Garri 2kg", 180_000, 130_000, true),
    ("PRV-BEANS-2KG", "Honey Beans 2kg", 320_000, 250_000, true),
    ("HSH-SOAP-BAR", "Laundry Soap Bar", 60_000, 40_000, false),
    ("HSH-BLEACH-1L", "Bleach 1L", 95_000, 65_000, false),
    ("SNK-BISCUIT", "Cream Biscuit", 25_000, 15_000, false),
    ("SNK-PLANTAIN", "Plantain Chips", 50_000, 30_000, false),
];

const LOCATIONS: &[(&str, &str, &str)] = &[
    ("Ikeja Branch", "Ikeja", "Lagos"),
    ("Surulere Branch", "Surulere", "Lagos"),
    ("Wuse Branch", "Wuse", "FCT"),
];

const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("Ngozi Bello", "Ikeja", "Lagos", "Ikeja"),
    ("Tunde Adeyemi", "Surulere", "Lagos", "Surulere"),
    ("Fatima Sani", "Wuse", "FCT", "Municipal"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./shopledger_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ShopLedger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shopledger_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("ShopLedger Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path).engine_config(EngineConfig::from_env());
    let db = Database::new(config).await.context("connecting database")?;
    println!("* Connected, migrations applied");

    // Each run seeds a fresh organization; existing tenants are untouched.
    let org = db
        .organizations()
        .create(&NewOrganization {
            name: "Amaka Stores".to_string(),
            jurisdiction: None,
        })
        .await
        .context("creating organization")?;
    let ctx = OrgContext::new(org.id.clone(), "seed-user");

    let seeded = db.tax_rules().seed_default_vat(&org.id).await?;
    match seeded {
        Some(rule) => println!("* VAT rule seeded: {} @ {} bps", rule.jurisdiction, rule.rate_bps),
        None => println!("* VAT rule already present"),
    }

    let mut location_ids = Vec::new();
    for (name, city, state) in LOCATIONS {
        let location = db
            .locations()
            .create(&NewLocation {
                org_id: org.id.clone(),
                name: name.to_string(),
                address: None,
                city: Some(city.to_string()),
                state: Some(state.to_string()),
            })
            .await?;
        location_ids.push(location.id);
    }
    println!("* {} locations", location_ids.len());

    let mut customer_ids = Vec::new();
    for (name, city, state, lga) in CUSTOMERS {
        let customer = db
            .customers()
            .create(&NewCustomer {
                org_id: org.id.clone(),
                name: name.to_string(),
                city: Some(city.to_string()),
                state: Some(state.to_string()),
                lga: Some(lga.to_string()),
                country: Some("Nigeria".to_string()),
                ..Default::default()
            })
            .await?;
        customer_ids.push(customer.id);
    }
    println!("* {} customers", customer_ids.len());

    let mut product_ids = Vec::new();
    for (idx, (sku, name, price, cost, exempt)) in CATALOG.iter().enumerate() {
        let product = db
            .products()
            .create(&NewProduct {
                org_id: org.id.clone(),
                sku: sku.to_string(),
                name: name.to_string(),
                price_cents: *price,
                cost_cents: Some(*cost),
                min_stock: None,
                tax_exempt: *exempt,
            })
            .await?;

        // Spread stock over the branches; deterministic but uneven.
        for (loc_idx, location_id) in location_ids.iter().enumerate() {
            let quantity = 10 + ((idx * 7 + loc_idx * 13) % 40) as i64;
            db.products()
                .receive_stock(&org.id, &product.id, location_id, quantity)
                .await?;
        }
        product_ids.push(product.id);
    }
    println!("* {} products stocked across branches", product_ids.len());

    // A batch of sales through the real engine, varying product, branch and
    // customer.
    let mut sales = 0usize;
    for round in 0..12usize {
        let product_idx = round % CATALOG.len();
        let (_, _, price, _, _) = CATALOG[product_idx];
        let location_id = &location_ids[round % location_ids.len()];
        let customer_id = if round % 3 == 0 {
            None
        } else {
            Some(customer_ids[round % customer_ids.len()].clone())
        };

        let draft = SaleDraft {
            location_id: Some(location_id.clone()),
            customer_id,
            branch_name: None,
            lines: vec![SaleLineInput {
                product_id: product_ids[product_idx].clone(),
                quantity: 1 + (round % 3) as i64,
                unit_price_cents: price,
                unit_cost_cents: None,
            }],
        };

        db.sales().create_sale(&ctx, &draft).await?;
        sales += 1;
    }
    println!("* {} sales committed", sales);

    let now = Utc::now();
    for (days_ago, amount, category) in [(2i64, 150_000i64, "rent"), (5, 40_000, "fuel"), (9, 25_000, "utilities")] {
        db.expenses()
            .record(&NewExpense {
                org_id: org.id.clone(),
                amount_cents: amount,
                category: category.to_string(),
                occurred_on: now - Duration::days(days_ago),
            })
            .await?;
    }
    println!("* 3 expenses recorded");

    // Show the pipeline end to end.
    let summary = db
        .analytics()
        .summary(&org.id, &ReportPeriod::Monthly)
        .await?;
    println!();
    println!("Monthly summary for {}", org.name);
    println!("  sales:             {}", summary.total_sales);
    println!("  revenue:           {}", summary.total_revenue_cents);
    println!("  VAT collected:     {}", summary.tax_total_cents);
    println!("  COGS:              {}", summary.cogs_cents);
    println!("  gross profit:      {}", summary.gross_profit_cents);
    println!("  expenses:          {}", summary.expenses_total_cents);
    println!("  profit before tax: {}", summary.profit_before_tax_cents);
    println!("  est. income tax:   {}", summary.estimated_income_tax_cents);
    println!("  profit after tax:  {}", summary.profit_after_tax_cents);
    println!("  low stock items:   {}", summary.low_stock_count);

    let top = db
        .analytics()
        .top_products(&org.id, &Default::default())
        .await?;
    println!();
    println!("Top products:");
    for entry in top {
        println!(
            "  {:>4} x {:<24} revenue {}",
            entry.quantity_sold, entry.name, entry.revenue_cents
        );
    }

    println!();
    println!("Seed complete (org id: {})", org.id);

    Ok(())
}

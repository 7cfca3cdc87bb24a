//! # tally
//!
//! Command line front end for the sale engine.
//!
//! ## Usage
//! ```bash
//! # Load demo products for a business
//! tally seed --business biz-1
//!
//! # Record a sale (request JSON from a file or stdin)
//! echo '{"branch_id":"br-1","payment_method":"cash","items":[{"product_id":"…","quantity":2}]}' \
//!     | tally sale --business biz-1 --cashier cashier-1
//!
//! # Dashboard figures
//! tally summary --business biz-1 --branch br-1
//!
//! # Unread notifications, then mark one read
//! tally notifications --business biz-1 --unread
//! tally mark-read --business biz-1 --id <notification-id>
//! ```
//!
//! Settings come from `TALLY_*` environment variables (see `config`).

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tally_core::{CreateSaleRequest, Product};
use tally_service::{AuthContext, SaleService, ServiceConfig};

/// Demo catalogue: (name, price in cents, stock, low-stock threshold)
const DEMO_PRODUCTS: &[(&str, i64, i64, i64)] = &[
    ("Coca-Cola 500ml", 150, 48, 10),
    ("Dasani Water", 99, 60, 12),
    ("Lay's Classic", 249, 30, 6),
    ("Snickers", 125, 40, 8),
    ("Whole Milk 1L", 349, 20, 5),
    ("Cheddar Block", 599, 12, 4),
    ("White Bread", 279, 15, 5),
    ("Spaghetti 500g", 189, 25, 5),
];

#[derive(Debug, Parser)]
#[command(name = "tally", about = "Tally POS sale engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Insert demo products for a business
    Seed(SeedArgs),
    /// Create a sale from a JSON request
    Sale(SaleArgs),
    /// Print the sales summary
    Summary(SummaryArgs),
    /// List notifications
    Notifications(NotificationArgs),
    /// Mark a notification as read
    MarkRead(MarkReadArgs),
}

#[derive(Debug, Args)]
struct SeedArgs {
    #[arg(long)]
    business: String,

    #[arg(long, default_value = "br-1")]
    branch: String,
}

#[derive(Debug, Args)]
struct SaleArgs {
    #[arg(long)]
    business: String,

    #[arg(long)]
    cashier: String,

    /// Request file; stdin when absent
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SummaryArgs {
    #[arg(long)]
    business: String,

    #[arg(long)]
    branch: Option<String>,
}

#[derive(Debug, Args)]
struct NotificationArgs {
    #[arg(long)]
    business: String,

    #[arg(long)]
    unread: bool,

    #[arg(long, default_value_t = 20)]
    limit: u32,

    #[arg(long, default_value_t = 0)]
    offset: u32,
}

#[derive(Debug, Args)]
struct MarkReadArgs {
    #[arg(long)]
    business: String,

    #[arg(long)]
    id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let service = SaleService::connect(&config)
        .await
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;

    let outcome = run(&service, cli.command).await;
    service.database().close().await;

    outcome
}

async fn run(service: &SaleService, command: Commands) -> Result<()> {
    match command {
        Commands::Seed(args) => seed(service, args).await,
        Commands::Sale(args) => {
            let raw = read_request(args.file.as_deref())?;
            let request: CreateSaleRequest =
                serde_json::from_str(&raw).context("request is not valid JSON")?;
            let auth = AuthContext::new(args.business, args.cashier);

            match service.create_sale(&auth, request).await {
                Ok(response) => print_json(&response),
                Err(err) => {
                    print_json(&err)?;
                    anyhow::bail!("sale rejected with status {}", err.status)
                }
            }
        }
        Commands::Summary(args) => {
            let summary = service
                .summary(&args.business, args.branch.as_deref())
                .await?;
            print_json(&summary)
        }
        Commands::Notifications(args) => {
            let list = service
                .notifications(&args.business, args.unread, args.limit, args.offset)
                .await?;
            print_json(&list)
        }
        Commands::MarkRead(args) => {
            service
                .mark_notification_read(&args.id, &args.business)
                .await?;
            Ok(())
        }
    }
}

async fn seed(service: &SaleService, args: SeedArgs) -> Result<()> {
    let products = service.database().products();
    let now = Utc::now().timestamp();

    for (name, price_cents, stock, threshold) in DEMO_PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            business_id: args.business.clone(),
            branch_id: args.branch.clone(),
            name: name.to_string(),
            selling_price_cents: *price_cents,
            cost_price_cents: price_cents * 7 / 10,
            quantity_in_stock: *stock,
            low_stock_threshold: *threshold,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        products.insert(&product).await?;
        println!("{}\t{}", product.id, product.name);
    }

    info!(business_id = %args.business, count = DEMO_PRODUCTS.len(), "Seeded products");
    Ok(())
}

fn read_request(file: Option<&std::path::Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read request from stdin")?;
            Ok(raw)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

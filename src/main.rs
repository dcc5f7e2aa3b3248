//! Order Allocator - Binary Entry Point
//!
//! Seeds an in-memory store from the config file, runs one buy or sell
//! allocation against it and prints the result.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use order_allocator::{InMemoryExchangeStore, OrderAllocator, Settings};

#[derive(Debug, Parser)]
#[command(name = "order-allocator", version, about = "Allocate crypto buys and sells across exchanges")]
struct Cli {
    /// Path to the TOML config; defaults are used when the file is absent
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Buy crypto from the cheapest asks
    Buy { amount: Decimal },

    /// Sell crypto into the highest bids
    Sell { amount: Decimal },

    /// List seeded exchanges and balances
    Exchanges,
}

fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    Settings::load(path).with_context(|| format!("failed to load {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;

    settings.logging.init();
    info!(
        config = %cli.config.display(),
        exchanges = settings.exchanges.len(),
        "order-allocator starting"
    );

    let store = InMemoryExchangeStore::from_seeds(&settings.exchanges)
        .context("failed to seed exchange store")?;
    let allocator = OrderAllocator::new(store, settings.allocation.clone());

    match cli.command {
        Command::Buy { amount } => {
            let result = allocator.buy(amount).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Sell { amount } => {
            let result = allocator.sell(amount).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Exchanges => {
            let exchanges = allocator.repository().exchanges();
            println!("{}", serde_json::to_string_pretty(&exchanges)?);
        }
    }

    println!("state root: {}", allocator.repository().state_root_hex());
    Ok(())
}

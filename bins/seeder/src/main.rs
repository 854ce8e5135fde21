//! Database seeder for Coffer development and testing.
//!
//! Seeds the currency reference table and a few demo wallets so the API can
//! be exercised locally. Currencies are upserted, so re-running is safe; every
//! run creates fresh wallets.
//!
//! Usage: cargo run --bin seeder

use coffer_core::wallet::Currency;
use coffer_db::{CurrencyRepository, WalletRepository, connect};
use coffer_shared::AppConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Code, name, minor units, fractional.
const CURRENCIES: &[(&str, &str, i32, bool)] = &[
    ("RUB", "Russian Ruble", 2, true),
    ("USD", "US Dollar", 2, true),
    ("EUR", "Euro", 2, true),
    ("KWD", "Kuwaiti Dinar", 3, true),
    ("JPY", "Japanese Yen", 0, false),
];

/// Currency code and opening balance in minor units.
const DEMO_WALLETS: &[(&str, i64)] = &[("RUB", 0), ("RUB", 100_000), ("USD", 2_500), ("JPY", 10_000)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    info!("Connecting to database...");
    let db = connect(&config.database).await?;

    info!("Seeding currencies...");
    let currencies = CurrencyRepository::new(db.clone());
    for &(code, name, minor_units, is_fractional) in CURRENCIES {
        currencies
            .upsert(&Currency {
                code: code.to_string(),
                name: name.to_string(),
                minor_units,
                is_fractional,
            })
            .await?;
        info!(code, minor_units, "  Currency ready");
    }

    info!("Seeding demo wallets...");
    let wallets = WalletRepository::new(db);
    for &(code, balance) in DEMO_WALLETS {
        let wallet = wallets.create_wallet(code, balance).await?;
        info!(wallet_id = %wallet.id, currency = code, balance, "  Created wallet");
    }

    info!("Seeding complete!");
    Ok(())
}

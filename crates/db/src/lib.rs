//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The wallet repository, which implements the core store and mutator traits
//! - Storage failure classification
//! - Database migrations

pub mod classify;
pub mod entities;
pub mod migration;
pub mod repositories;

pub use classify::{classify_failure, into_wallet_error};
pub use repositories::{CurrencyRepository, WalletRepository};

use coffer_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .sqlx_logging(false);

    Database::connect(options).await
}

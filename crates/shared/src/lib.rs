//! Shared identifiers, errors, and configuration for Coffer.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for wallets and ledger entries
//! - Request-level error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LogConfig, ServerConfig, WalletConfig};
pub use error::AppError;
pub use types::{TransactionId, WalletId};

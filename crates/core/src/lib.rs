//! Core business logic for Coffer.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached only through the traits in [`wallet::store`].
//!
//! # Modules
//!
//! - `currency` - Decimal text to minor-unit conversion
//! - `wallet` - Balance invariants, retry controller, and the operation orchestrator

pub mod currency;
pub mod wallet;

//! Storage seams consumed by the wallet orchestrator.
//!
//! `coffer-db` implements both traits against PostgreSQL; tests use mocks or
//! the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use coffer_shared::WalletId;

use super::error::WalletError;
use super::types::{Currency, OperationKind, Wallet};

/// Read access to wallets and currency reference data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Loads a wallet, failing with `WalletNotFound` if it does not exist.
    async fn get_wallet(&self, id: WalletId) -> Result<Wallet, WalletError>;

    /// Loads a currency, failing with `CurrencyNotFound` if it is not configured.
    async fn get_currency(&self, code: &str) -> Result<Currency, WalletError>;
}

/// The transactional mutator: the only writer of balances and ledger entries.
///
/// One call is one atomic unit. On success the balance change and its
/// COMPLETED ledger entry are both committed and the new balance is returned;
/// on any failure neither is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceMutator: Send + Sync {
    /// Applies `amount` (positive, minor units) to the wallet.
    async fn apply(
        &self,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError>;
}

#[async_trait]
impl<T: WalletStore + ?Sized> WalletStore for Arc<T> {
    async fn get_wallet(&self, id: WalletId) -> Result<Wallet, WalletError> {
        (**self).get_wallet(id).await
    }

    async fn get_currency(&self, code: &str) -> Result<Currency, WalletError> {
        (**self).get_currency(code).await
    }
}

#[async_trait]
impl<T: BalanceMutator + ?Sized> BalanceMutator for Arc<T> {
    async fn apply(
        &self,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError> {
        (**self).apply(wallet_id, amount, kind).await
    }
}

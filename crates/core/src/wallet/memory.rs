//! In-memory wallet store for tests.
//!
//! Implements both [`WalletStore`] and [`BalanceMutator`] behind a single
//! mutex, so every `apply` is atomic with respect to every other call. It
//! never reports transient conflicts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use coffer_shared::WalletId;

use super::error::WalletError;
use super::store::{BalanceMutator, WalletStore};
use super::types::{Currency, LedgerEntry, OperationKind, Wallet};

#[derive(Debug, Default)]
struct State {
    wallets: HashMap<WalletId, Wallet>,
    currencies: HashMap<String, Currency>,
    ledger: Vec<LedgerEntry>,
}

/// Wallets, currencies and ledger held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryWalletStore {
    state: Mutex<State>,
}

impl InMemoryWalletStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a currency, replacing any with the same code.
    pub fn insert_currency(&self, currency: Currency) {
        self.lock()
            .currencies
            .insert(currency.code.clone(), currency);
    }

    /// Creates a wallet with the given opening balance and returns its ID.
    ///
    /// The currency is not required to exist, so tests can model a wallet
    /// whose currency was never configured.
    pub fn create_wallet(&self, currency_code: &str, balance: i64) -> WalletId {
        let now = Utc::now();
        let wallet = Wallet {
            id: WalletId::new(),
            balance,
            currency_code: currency_code.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = wallet.id;
        self.lock().wallets.insert(id, wallet);
        id
    }

    /// Current balance, if the wallet exists.
    #[must_use]
    pub fn balance_of(&self, wallet_id: WalletId) -> Option<i64> {
        self.lock().wallets.get(&wallet_id).map(|w| w.balance)
    }

    /// Ledger entries for a wallet, oldest first.
    #[must_use]
    pub fn ledger(&self, wallet_id: WalletId) -> Vec<LedgerEntry> {
        self.lock()
            .ledger
            .iter()
            .filter(|entry| entry.wallet_id == wallet_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation completes before the guard drops, so a poisoned
        // state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn get_wallet(&self, id: WalletId) -> Result<Wallet, WalletError> {
        self.lock()
            .wallets
            .get(&id)
            .cloned()
            .ok_or(WalletError::WalletNotFound(id))
    }

    async fn get_currency(&self, code: &str) -> Result<Currency, WalletError> {
        self.lock()
            .currencies
            .get(code)
            .cloned()
            .ok_or_else(|| WalletError::CurrencyNotFound(code.to_string()))
    }
}

#[async_trait]
impl BalanceMutator for InMemoryWalletStore {
    async fn apply(
        &self,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError> {
        if amount <= 0 {
            return Err(WalletError::NonPositiveAmount);
        }

        let mut state = self.lock();
        let wallet = state
            .wallets
            .get_mut(&wallet_id)
            .ok_or(WalletError::WalletNotFound(wallet_id))?;

        let next = wallet
            .balance
            .checked_add(kind.signed_delta(amount))
            .ok_or(WalletError::AmountOverflow)?;
        if next < 0 {
            return Err(WalletError::InsufficientFunds {
                balance: wallet.balance,
                requested: amount,
            });
        }

        wallet.balance = next;
        wallet.updated_at = Utc::now();
        state
            .ledger
            .push(LedgerEntry::completed(wallet_id, kind, amount));
        Ok(next)
    }
}

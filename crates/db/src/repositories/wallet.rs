//! Wallet repository: the storage side of wallet operations.
//!
//! Implements [`WalletStore`] for reads and [`BalanceMutator`] for the atomic
//! unit that changes a balance and appends its ledger entry.

use async_trait::async_trait;
use chrono::Utc;
use coffer_core::wallet::{
    BalanceMutator, Currency, LedgerEntry, OperationKind, Wallet, WalletError, WalletStore,
};
use coffer_shared::{TransactionId, WalletId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IsolationLevel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};

use crate::classify::into_wallet_error;
use crate::entities::{currencies, transactions, wallets};

/// Wallet repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a wallet with an opening balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency does not exist or the insert fails.
    pub async fn create_wallet(&self, currency_code: &str, balance: i64) -> Result<Wallet, DbErr> {
        let now = Utc::now();
        let model = wallets::ActiveModel {
            id: Set(WalletId::new().into_inner()),
            balance: Set(balance),
            currency_code: Set(currency_code.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        Ok(to_wallet(model))
    }

    /// Lists ledger entries of a wallet, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn ledger(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>, DbErr> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(wallet_id.into_inner()))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(to_ledger_entry).collect())
    }

    /// Runs the mutation statements inside an open transaction.
    async fn mutate(
        txn: &DatabaseTransaction,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError> {
        let delta = kind.signed_delta(amount);

        // UPDATE wallets SET balance = balance + $1 ... RETURNING *
        let updated = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::Balance,
                Expr::col(wallets::Column::Balance).add(delta),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet_id.into_inner()))
            .exec_with_returning(txn)
            .await
            .map_err(into_wallet_error)?;

        let balance = updated
            .first()
            .map(|wallet| wallet.balance)
            .ok_or(WalletError::WalletNotFound(wallet_id))?;

        if balance < 0 {
            return Err(WalletError::InsufficientFunds {
                balance: balance.saturating_add(amount),
                requested: amount,
            });
        }

        let entry = LedgerEntry::completed(wallet_id, kind, amount);
        transactions::ActiveModel {
            id: Set(entry.id.into_inner()),
            wallet_id: Set(entry.wallet_id.into_inner()),
            operation_type: Set(entry.kind.into()),
            amount: Set(entry.amount),
            status: Set(entry.status.into()),
            created_at: Set(entry.created_at.into()),
        }
        .insert(txn)
        .await
        .map_err(into_wallet_error)?;

        Ok(balance)
    }
}

#[async_trait]
impl WalletStore for WalletRepository {
    async fn get_wallet(&self, id: WalletId) -> Result<Wallet, WalletError> {
        wallets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(into_wallet_error)?
            .map(to_wallet)
            .ok_or(WalletError::WalletNotFound(id))
    }

    async fn get_currency(&self, code: &str) -> Result<Currency, WalletError> {
        currencies::Entity::find_by_id(code.to_string())
            .one(&self.db)
            .await
            .map_err(into_wallet_error)?
            .map(to_currency)
            .ok_or_else(|| WalletError::CurrencyNotFound(code.to_string()))
    }
}

#[async_trait]
impl BalanceMutator for WalletRepository {
    /// One SERIALIZABLE unit: update the balance, append the ledger entry, commit.
    ///
    /// The transaction is committed or rolled back before this returns, so its
    /// connection is back in the pool before the caller decides to retry.
    async fn apply(
        &self,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError> {
        if amount <= 0 {
            return Err(WalletError::NonPositiveAmount);
        }

        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .map_err(into_wallet_error)?;

        match Self::mutate(&txn, wallet_id, amount, kind).await {
            Ok(balance) => {
                txn.commit().await.map_err(into_wallet_error)?;
                debug!(wallet_id = %wallet_id, balance, "Wallet mutation committed");
                Ok(balance)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(
                        wallet_id = %wallet_id,
                        error = %rollback_err,
                        "Wallet mutation rollback failed"
                    );
                }
                Err(err)
            }
        }
    }
}

fn to_wallet(model: wallets::Model) -> Wallet {
    Wallet {
        id: WalletId::from_uuid(model.id),
        balance: model.balance,
        currency_code: model.currency_code,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn to_currency(model: currencies::Model) -> Currency {
    Currency {
        code: model.code,
        name: model.name,
        minor_units: model.minor_units,
        is_fractional: model.is_fractional,
    }
}

fn to_ledger_entry(model: transactions::Model) -> LedgerEntry {
    LedgerEntry {
        id: TransactionId::from_uuid(model.id),
        wallet_id: WalletId::from_uuid(model.wallet_id),
        kind: model.operation_type.into(),
        amount: model.amount,
        status: model.status.into(),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

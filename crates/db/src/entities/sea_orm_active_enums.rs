//! `SeaORM` active enums mapped to Postgres enum types.

use coffer_core::wallet::{OperationKind, TransactionStatus as LedgerStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `wallet_operation_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "wallet_operation_type")]
pub enum OperationType {
    /// Funds added.
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    /// Funds removed.
    #[sea_orm(string_value = "WITHDRAW")]
    Withdraw,
}

/// `transaction_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    /// Committed together with its balance change.
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Not written by the wallet mutator.
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl From<OperationKind> for OperationType {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Deposit => Self::Deposit,
            OperationKind::Withdraw => Self::Withdraw,
        }
    }
}

impl From<OperationType> for OperationKind {
    fn from(kind: OperationType) -> Self {
        match kind {
            OperationType::Deposit => Self::Deposit,
            OperationType::Withdraw => Self::Withdraw,
        }
    }
}

impl From<LedgerStatus> for TransactionStatus {
    fn from(status: LedgerStatus) -> Self {
        match status {
            LedgerStatus::Completed => Self::Completed,
            LedgerStatus::Failed => Self::Failed,
        }
    }
}

impl From<TransactionStatus> for LedgerStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}

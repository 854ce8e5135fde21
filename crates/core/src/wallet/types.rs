//! Domain types for wallet operations.

use chrono::{DateTime, Utc};
use coffer_shared::{TransactionId, WalletId};
use serde::{Deserialize, Serialize};

use super::error::WalletError;
use crate::currency::MAX_EXPONENT;

/// Kind of balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    /// Adds funds to the wallet.
    Deposit,
    /// Removes funds from the wallet.
    Withdraw,
}

impl OperationKind {
    /// Signed balance change for a positive `amount`.
    #[must_use]
    pub const fn signed_delta(self, amount: i64) -> i64 {
        match self {
            Self::Deposit => amount,
            Self::Withdraw => -amount,
        }
    }

    /// Returns the wire name (`DEPOSIT` / `WITHDRAW`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAW" => Ok(Self::Withdraw),
            _ => Err(format!("Unknown operation type: {s}")),
        }
    }
}

/// Status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// The paired balance mutation committed.
    Completed,
    /// Reserved for entries recorded outside a committed mutation.
    Failed,
}

/// A wallet as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet ID.
    pub id: WalletId,
    /// Balance in minor units of `currency_code`.
    pub balance: i64,
    /// Currency code (e.g. "RUB").
    pub currency_code: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Currency reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Number of decimal digits represented by one minor unit (2 for cents).
    pub minor_units: i32,
    /// Whether the currency has a fractional part at all.
    pub is_fractional: bool,
}

impl Currency {
    /// Returns the validated minor-unit exponent.
    ///
    /// A fractional currency must have a positive exponent, and the exponent
    /// must be small enough for `i64` minor units.
    pub fn exponent(&self) -> Result<u32, WalletError> {
        let invalid = || {
            WalletError::InvalidCurrencyExponent(format!(
                "{}: minor_units={}, is_fractional={}",
                self.code, self.minor_units, self.is_fractional
            ))
        };

        let exponent = u32::try_from(self.minor_units).map_err(|_| invalid())?;
        if exponent > MAX_EXPONENT || (self.is_fractional && exponent == 0) {
            return Err(invalid());
        }
        Ok(exponent)
    }
}

/// A ledger entry to append alongside a balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID, fresh for every entry.
    pub id: TransactionId,
    /// Owning wallet.
    pub wallet_id: WalletId,
    /// Operation kind; the sign of the change is implied by it.
    pub kind: OperationKind,
    /// Amount in minor units, always positive.
    pub amount: i64,
    /// Entry status.
    pub status: TransactionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Builds the COMPLETED entry paired with a committed mutation.
    #[must_use]
    pub fn completed(wallet_id: WalletId, kind: OperationKind, amount: i64) -> Self {
        Self {
            id: TransactionId::new(),
            wallet_id,
            kind,
            amount,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }
}

/// A request to deposit into or withdraw from a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOperation {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// Deposit or withdraw.
    pub kind: OperationKind,
    /// Amount as entered, e.g. `"12,34"`.
    pub amount: String,
}

/// Result of a committed wallet operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// Operation kind.
    pub kind: OperationKind,
    /// Applied amount in minor units.
    pub amount_minor: i64,
    /// Authoritative balance after commit, in minor units.
    pub balance_minor: i64,
    /// Balance after commit as decimal text.
    pub balance: String,
    /// Currency code.
    pub currency: String,
}

/// Current balance of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    /// Wallet ID.
    pub wallet_id: WalletId,
    /// Currency code.
    pub currency: String,
    /// Balance in minor units.
    pub balance_minor: i64,
    /// Balance as decimal text.
    pub balance: String,
}

//! Balance invariant checks.
//!
//! A committed wallet balance is never negative and never wraps. These checks
//! run before the atomic unit against the balance the caller last read; the
//! storage layer repeats the negativity check against the freshest balance.

use super::error::WalletError;
use super::types::OperationKind;

/// Checks that applying `amount` to `current_balance` keeps the balance valid.
///
/// Returns the amount unchanged on success.
pub fn check_operation(
    current_balance: i64,
    amount: i64,
    kind: OperationKind,
) -> Result<i64, WalletError> {
    if amount <= 0 {
        return Err(WalletError::NonPositiveAmount);
    }

    match kind {
        OperationKind::Withdraw if amount > current_balance => Err(WalletError::InsufficientFunds {
            balance: current_balance,
            requested: amount,
        }),
        OperationKind::Withdraw => Ok(amount),
        OperationKind::Deposit => current_balance
            .checked_add(amount)
            .map(|_| amount)
            .ok_or(WalletError::AmountOverflow),
    }
}

/// Applies `amount` to `current_balance`, enforcing the same invariants.
///
/// Returns the resulting balance.
pub fn apply_operation(
    current_balance: i64,
    amount: i64,
    kind: OperationKind,
) -> Result<i64, WalletError> {
    check_operation(current_balance, amount, kind)?;
    current_balance
        .checked_add(kind.signed_delta(amount))
        .ok_or(WalletError::AmountOverflow)
}

//! Wallet error types and their classification.
//!
//! Every failure a wallet operation can produce is a variant of [`WalletError`].
//! The variant alone decides whether the failure is retried, how it is logged,
//! and which response the HTTP layer sends, so no layer ever has to inspect
//! error text.

use std::time::Duration;

use coffer_shared::WalletId;
use thiserror::Error;

use crate::currency::{AmountError, MAX_EXPONENT};

/// How a failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Aborted purely by contention; safe to retry as a fresh unit.
    Transient,
    /// Caller input or business rule violation; never retried.
    Domain,
    /// Infrastructure or configuration fault; surfaced as a server failure.
    Fatal,
}

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    // ========== Input Errors ==========
    /// Amount text is not a well-formed decimal for the wallet's currency.
    #[error("Malformed amount: {0:?}")]
    MalformedAmount(String),

    /// Amount is zero.
    #[error("Amount must be positive")]
    NonPositiveAmount,

    // ========== Domain Errors ==========
    /// Wallet does not exist.
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// Withdrawal larger than the current balance.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance in minor units at the time of the check.
        balance: i64,
        /// Requested withdrawal in minor units.
        requested: i64,
    },

    /// Amount or resulting balance does not fit in 64 bits.
    #[error("Amount overflows the wallet balance")]
    AmountOverflow,

    /// Currency's minor-unit exponent is unusable.
    #[error("Invalid currency exponent: {0}")]
    InvalidCurrencyExponent(String),

    // ========== Transient Errors ==========
    /// Serialization failure or deadlock reported by the storage engine.
    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    // ========== Fatal Errors ==========
    /// Transient conflicts persisted through every allowed attempt.
    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The conflict that failed the final attempt.
        #[source]
        last: Box<WalletError>,
    },

    /// The caller's deadline expired before the operation finished.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Wallet references a currency that is not configured.
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    /// Storage unreachable or failed in a non-retryable way.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Classifies the failure for retry and reporting decisions.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::MalformedAmount(_)
            | Self::NonPositiveAmount
            | Self::WalletNotFound(_)
            | Self::InsufficientFunds { .. }
            | Self::AmountOverflow
            | Self::InvalidCurrencyExponent(_) => FailureClass::Domain,
            Self::TransientConflict(_) => FailureClass::Transient,
            Self::RetriesExhausted { .. }
            | Self::Timeout(_)
            | Self::CurrencyNotFound(_)
            | Self::Storage(_)
            | Self::Internal(_) => FailureClass::Fatal,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.class(), FailureClass::Transient)
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedAmount(_) => "MALFORMED_AMOUNT",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::InvalidCurrencyExponent(_) => "INVALID_CURRENCY_EXPONENT",
            Self::TransientConflict(_) => "TRANSIENT_CONFLICT",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Self::Timeout(_) => "TIMEOUT",
            Self::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller input
            Self::MalformedAmount(_) | Self::NonPositiveAmount => 400,

            // 404 Not Found
            Self::WalletNotFound(_) => 404,

            // 409 Conflict - only reachable if a conflict escapes the retry controller
            Self::TransientConflict(_) => 409,

            // 422 Unprocessable Entity - business rules
            Self::InsufficientFunds { .. }
            | Self::AmountOverflow
            | Self::InvalidCurrencyExponent(_) => 422,

            // 503 / 504 - server side, caller may retry later
            Self::RetriesExhausted { .. } => 503,
            Self::Timeout(_) => 504,

            // 500 Internal Server Error
            Self::CurrencyNotFound(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<AmountError> for WalletError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::Malformed(text) => Self::MalformedAmount(text),
            AmountError::NonPositive => Self::NonPositiveAmount,
            AmountError::Overflow => Self::AmountOverflow,
            AmountError::UnsupportedExponent(exponent) => Self::InvalidCurrencyExponent(format!(
                "exponent {exponent} exceeds the supported maximum of {MAX_EXPONENT}"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::error::Error as _;

    fn conflict() -> WalletError {
        WalletError::TransientConflict("could not serialize access".to_string())
    }

    #[rstest]
    #[case(WalletError::MalformedAmount("x".into()), FailureClass::Domain, 400, "MALFORMED_AMOUNT")]
    #[case(WalletError::NonPositiveAmount, FailureClass::Domain, 400, "NON_POSITIVE_AMOUNT")]
    #[case(WalletError::WalletNotFound(WalletId::new()), FailureClass::Domain, 404, "WALLET_NOT_FOUND")]
    #[case(WalletError::InsufficientFunds { balance: 500, requested: 600 }, FailureClass::Domain, 422, "INSUFFICIENT_FUNDS")]
    #[case(WalletError::AmountOverflow, FailureClass::Domain, 422, "AMOUNT_OVERFLOW")]
    #[case(WalletError::InvalidCurrencyExponent("x".into()), FailureClass::Domain, 422, "INVALID_CURRENCY_EXPONENT")]
    #[case(conflict(), FailureClass::Transient, 409, "TRANSIENT_CONFLICT")]
    #[case(WalletError::RetriesExhausted { attempts: 6, last: Box::new(conflict()) }, FailureClass::Fatal, 503, "RETRIES_EXHAUSTED")]
    #[case(WalletError::Timeout(Duration::from_secs(1)), FailureClass::Fatal, 504, "TIMEOUT")]
    #[case(WalletError::CurrencyNotFound("XXX".into()), FailureClass::Fatal, 500, "CURRENCY_NOT_FOUND")]
    #[case(WalletError::Storage("down".into()), FailureClass::Fatal, 500, "STORAGE_ERROR")]
    #[case(WalletError::Internal("bug".into()), FailureClass::Fatal, 500, "INTERNAL_ERROR")]
    fn test_classification(
        #[case] err: WalletError,
        #[case] class: FailureClass,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.class(), class);
        assert_eq!(err.http_status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_only_transient_conflicts_are_retryable() {
        assert!(conflict().is_retryable());
        assert!(!WalletError::InsufficientFunds { balance: 0, requested: 1 }.is_retryable());
        assert!(!WalletError::Storage("down".into()).is_retryable());
        assert!(
            !WalletError::RetriesExhausted {
                attempts: 6,
                last: Box::new(conflict()),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_retries_exhausted_keeps_last_conflict_as_source() {
        let err = WalletError::RetriesExhausted {
            attempts: 6,
            last: Box::new(conflict()),
        };
        assert_eq!(err.to_string(), "Gave up after 6 attempts");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("Transient conflict: could not serialize access")
        );
    }

    #[test]
    fn test_from_amount_error() {
        assert!(matches!(
            WalletError::from(AmountError::Malformed("1.2.3".into())),
            WalletError::MalformedAmount(text) if text == "1.2.3"
        ));
        assert!(matches!(
            WalletError::from(AmountError::NonPositive),
            WalletError::NonPositiveAmount
        ));
        assert!(matches!(
            WalletError::from(AmountError::Overflow),
            WalletError::AmountOverflow
        ));
        assert!(matches!(
            WalletError::from(AmountError::UnsupportedExponent(30)),
            WalletError::InvalidCurrencyExponent(_)
        ));
    }

    #[test]
    fn test_error_display() {
        let err = WalletError::InsufficientFunds {
            balance: 500,
            requested: 600,
        };
        assert_eq!(err.to_string(), "Insufficient funds: balance 500, requested 600");
    }
}

//! Storage failure classification.
//!
//! This is the only place that reads Postgres SQLSTATE codes. Everything above
//! the database layer sees a classified [`WalletError`].

use coffer_core::wallet::{FailureClass, WalletError};
use sea_orm::{DbErr, RuntimeErr};

/// `serialization_failure`
pub const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
pub const DEADLOCK_DETECTED: &str = "40P01";
/// `numeric_value_out_of_range`
pub const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Classifies a SQLSTATE code.
#[must_use]
pub fn classify_sqlstate(code: &str) -> FailureClass {
    match code {
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED => FailureClass::Transient,
        // BIGINT overflow on `balance + delta`
        NUMERIC_VALUE_OUT_OF_RANGE => FailureClass::Domain,
        _ => FailureClass::Fatal,
    }
}

/// Classifies a database error for retry decisions.
#[must_use]
pub fn classify_failure(err: &DbErr) -> FailureClass {
    sqlstate(err).map_or(FailureClass::Fatal, |code| classify_sqlstate(&code))
}

/// Returns the SQLSTATE reported by Postgres, if the error carries one.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    let (DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime)) = err else {
        return None;
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(std::borrow::Cow::into_owned),
        RuntimeErr::Internal(_) => None,
    }
}

/// Converts a database error into the wallet error taxonomy.
#[must_use]
pub fn into_wallet_error(err: DbErr) -> WalletError {
    match sqlstate(&err) {
        Some(code) => match classify_sqlstate(&code) {
            FailureClass::Transient => WalletError::TransientConflict(format!("{code}: {err}")),
            FailureClass::Domain => WalletError::AmountOverflow,
            FailureClass::Fatal => WalletError::Storage(format!("{code}: {err}")),
        },
        None => WalletError::Storage(err.to_string()),
    }
}

//! Error-to-response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coffer_core::wallet::{FailureClass, WalletError};
use coffer_shared::{AppError, WalletId};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `INSUFFICIENT_FUNDS`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Wallet the request targeted, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<WalletId>,
}

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Request-level failure before the wallet core was reached.
    App(AppError),
    /// Failure reported by the wallet core.
    Wallet {
        /// The classified failure.
        error: WalletError,
        /// Target wallet.
        wallet_id: Option<WalletId>,
    },
}

impl ApiError {
    /// Wraps a wallet failure for the given wallet.
    #[must_use]
    pub fn wallet(error: WalletError, wallet_id: WalletId) -> Self {
        Self::Wallet {
            error,
            wallet_id: Some(wallet_id),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<WalletError> for ApiError {
    fn from(error: WalletError) -> Self {
        Self::Wallet {
            error,
            wallet_id: None,
        }
    }
}

/// Message shown to the caller. Fatal details stay in the logs.
fn wallet_message(err: &WalletError) -> String {
    match err {
        WalletError::RetriesExhausted { .. } => {
            "Wallet is busy, please retry the operation later".to_string()
        }
        WalletError::Timeout(_) => "Operation timed out".to_string(),
        _ if err.class() == FailureClass::Fatal => "An error occurred".to_string(),
        _ => err.to_string(),
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::App(err) => {
                if let AppError::Internal(_) = err {
                    error!(error = %err, "Request failed");
                }
                let message = match &err {
                    AppError::Internal(_) => "An error occurred".to_string(),
                    AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
                };
                (
                    status_from(err.status_code()),
                    ErrorBody {
                        error: err.error_code().to_string(),
                        message,
                        wallet_id: None,
                    },
                )
            }
            Self::Wallet { error, wallet_id } => (
                status_from(error.http_status_code()),
                ErrorBody {
                    error: error.error_code().to_string(),
                    message: wallet_message(&error),
                    wallet_id,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
